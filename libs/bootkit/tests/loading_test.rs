use std::collections::BTreeMap;
use std::fs;

use bootkit::{Format, LoadError, Loader, Value};

#[test]
fn loads_a_directory_in_file_name_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("20-workers.yaml"),
        "modules:\n  - id: worker\n    priority: 5\n  - id: worker\n    name: spare\n    priority: 5\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("10-core.json"),
        r#"{"modules": [{"id": "core", "priority": 5}, {"id": "late"}]}"#,
    )
    .unwrap();
    fs::write(dir.path().join("README.md"), "not a definition file").unwrap();
    fs::create_dir(dir.path().join("nested.yaml")).unwrap();

    let set = Loader::new().load_dir(dir.path()).unwrap();
    let order: Vec<(&str, Option<&str>)> = set.iter().map(|d| (d.id.as_str(), d.name.as_deref())).collect();
    assert_eq!(
        order,
        [("core", None), ("worker", None), ("worker", Some("spare")), ("late", None)],
        "equal priorities keep file order; unset priority sorts last"
    );
}

#[test]
fn environment_fills_placeholders() {
    let yaml = r#"
modules:
  - id: server
    config:
      endpoint: "http://${BOOTKIT_IT_HOST}:${BOOTKIT_IT_PORT:-8080}/${pname}"
      tags: ["${BOOTKIT_IT_TAG:-none}", "$${literal}"]
"#;
    let mut variables = BTreeMap::new();
    variables.insert("pname".to_owned(), "booter".to_owned());
    variables.insert("BOOTKIT_IT_HOST".to_owned(), "from-builder".to_owned());

    temp_env::with_vars(
        [
            ("BOOTKIT_IT_HOST", Some("from-env")),
            ("BOOTKIT_IT_PORT", Some("9000")),
            ("BOOTKIT_IT_TAG", Some("")),
        ],
        || {
            let loader = Loader::new().with_variables(variables);
            let definitions = loader.parse_str(yaml, Format::Yaml, "inline").unwrap();
            let config = definitions[0].config.as_map().unwrap();

            assert_eq!(
                config["endpoint"].as_str(),
                Some("http://from-builder:9000/booter"),
                "builder variables shadow the environment"
            );
            let Value::Seq(tags) = &config["tags"] else {
                panic!("tags must stay a sequence");
            };
            assert_eq!(tags[0].as_str(), Some("none"), "empty variables fall back to the default");
            assert_eq!(tags[1].as_str(), Some("${literal}"));
        },
    );
}

#[test]
fn missing_variable_names_the_document() {
    temp_env::with_var_unset("BOOTKIT_IT_MISSING", || {
        let err = Loader::new()
            .parse_str(
                r#"{"modules": [{"id": "m", "config": {"x": "${BOOTKIT_IT_MISSING}"}}]}"#,
                Format::Json,
                "inline.json",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnresolvedVariable { ref origin, ref name }
                if origin == "inline.json" && name == "BOOTKIT_IT_MISSING"
        ));
    });
}

#[test]
fn rejects_bad_documents() {
    let loader = Loader::new();

    let err = loader
        .parse_str("modules:\n  - id: a\n    prority: 3\n", Format::Yaml, "typo.yaml")
        .unwrap_err();
    assert!(matches!(err, LoadError::Yaml { .. }));

    let err = loader
        .parse_str(r#"{"modules": [{"id": "  "}]}"#, Format::Json, "blank.json")
        .unwrap_err();
    assert!(matches!(err, LoadError::EmptyId { .. }));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modules.toml");
    fs::write(&path, "").unwrap();
    assert!(matches!(
        loader.load_file(&path).unwrap_err(),
        LoadError::UnsupportedFormat { .. }
    ));
    assert!(matches!(
        loader.load_file(&dir.path().join("absent.yaml")).unwrap_err(),
        LoadError::Io { .. }
    ));
}
