use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
    Key(String),
}

/// Location of a value inside a configuration document, used for diagnostics.
///
/// Renders as `tcp-config.tls.handshake-timeout`, `levels[2]` or
/// `routes["api"].timeout`. The empty path renders as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push_field(&mut self, name: &str) {
        self.segments.push(Segment::Field(name.to_owned()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    pub fn push_key(&mut self, key: &str) {
        self.segments.push(Segment::Key(key.to_owned()));
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_mixed_segments() {
        let mut path = FieldPath::root();
        assert_eq!(path.to_string(), "<root>");

        path.push_field("routes");
        path.push_key("api");
        path.push_field("upstreams");
        path.push_index(2);
        path.push_field("timeout");
        assert_eq!(path.to_string(), r#"routes["api"].upstreams[2].timeout"#);

        path.pop();
        path.pop();
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_string(), r#"routes["api"].upstreams"#);
    }

    #[test]
    fn index_at_root_has_no_leading_dot() {
        let mut path = FieldPath::root();
        path.push_index(0);
        path.push_field("id");
        assert_eq!(path.to_string(), "[0].id");
    }
}
