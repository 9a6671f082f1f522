use crate::engine::EngineError;
use std::fmt;

/// Deepest node nesting accepted by [`parse`]. Real CRS definitions stay
/// well under ten levels.
const MAX_DEPTH: usize = 64;

/// One `KEYWORD[...]` node of a WKT tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WktNode {
    pub name: String,
    pub children: Vec<WktValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WktValue {
    Quoted(String),
    /// Numbers and unquoted keywords such as `NORTH`.
    Bare(String),
    Node(WktNode),
}

impl WktValue {
    pub fn text(&self) -> &str {
        match self {
            WktValue::Quoted(s) | WktValue::Bare(s) => s,
            WktValue::Node(n) => &n.name,
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            WktValue::Bare(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn number_str(n: f64) -> WktValue {
        // normalize negative zero so it prints as 0
        let n = if n == 0.0 { 0.0 } else { n };
        WktValue::Bare(format!("{}", n))
    }
}

impl WktNode {
    pub fn new<S: Into<String>>(name: S) -> Self {
        WktNode {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn quoted<S: Into<String>>(mut self, s: S) -> Self {
        self.children.push(WktValue::Quoted(s.into()));
        self
    }

    pub fn number(mut self, n: f64) -> Self {
        self.children.push(WktValue::number_str(n));
        self
    }

    pub fn node(mut self, node: WktNode) -> Self {
        self.children.push(WktValue::Node(node));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Depth first search, this node included.
    pub fn find(&self, name: &str) -> Option<&WktNode> {
        if self.is(name) {
            return Some(self);
        }
        self.nodes().find_map(|n| n.find(name))
    }

    /// Direct child node with the given keyword.
    pub fn child(&self, name: &str) -> Option<&WktNode> {
        self.nodes().find(|n| n.is(name))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &WktNode> {
        self.children.iter().filter_map(|c| match c {
            WktValue::Node(n) => Some(n),
            _ => None,
        })
    }

    pub fn value(&self, index: usize) -> Option<&WktValue> {
        self.children.get(index)
    }
}

impl fmt::Display for WktNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.name)?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match child {
                WktValue::Quoted(s) => write!(f, "\"{}\"", s.replace('"', "\"\""))?,
                WktValue::Bare(s) => f.write_str(s)?,
                WktValue::Node(n) => write!(f, "{}", n)?,
            }
        }
        f.write_str("]")
    }
}

/// Parse one WKT node from the front of `text`, advancing it past the node.
pub(crate) fn parse(text: &mut &str) -> Result<WktNode, EngineError> {
    let src = *text;
    let mut parser = Parser { src, pos: 0, depth: 0 };
    parser.skip_ws();
    let keyword = parser.keyword()?;
    let node = parser.node(keyword)?;
    *text = &src[parser.pos..];
    Ok(node)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error<T>(&self, message: &str) -> Result<T, EngineError> {
        Err(EngineError::CorruptWkt {
            offset: self.pos,
            message: message.to_owned(),
        })
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn keyword(&mut self) -> Result<String, EngineError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        if start == self.pos {
            return self.error("expected keyword");
        }
        Ok(self.src[start..self.pos].to_owned())
    }

    fn node(&mut self, name: String) -> Result<WktNode, EngineError> {
        if self.depth == MAX_DEPTH {
            return self.error("nodes nested too deeply");
        }
        self.depth += 1;
        let node = self.node_body(name);
        self.depth -= 1;
        node
    }

    fn node_body(&mut self, name: String) -> Result<WktNode, EngineError> {
        self.skip_ws();
        let close = match self.bump() {
            Some('[') => ']',
            Some('(') => ')',
            _ => return self.error("expected `[` or `(`"),
        };
        let mut node = WktNode::new(name);
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(node);
        }
        loop {
            self.skip_ws();
            let value = self.value()?;
            node.children.push(value);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(node),
                Some(_) => return self.error("expected `,` or closing bracket"),
                None => return self.error("unexpected end of text"),
            }
        }
    }

    fn value(&mut self) -> Result<WktValue, EngineError> {
        match self.peek() {
            Some('"') => self.quoted().map(WktValue::Quoted),
            Some(c) if c.is_ascii_alphabetic() => {
                let keyword = self.keyword()?;
                self.skip_ws();
                if matches!(self.peek(), Some('[') | Some('(')) {
                    self.node(keyword).map(WktValue::Node)
                } else {
                    Ok(WktValue::Bare(keyword))
                }
            }
            Some(_) => self.bare().map(WktValue::Bare),
            None => self.error("unexpected end of text"),
        }
    }

    fn quoted(&mut self) -> Result<String, EngineError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') if self.peek() == Some('"') => {
                    self.pos += 1;
                    out.push('"');
                }
                Some('"') => return Ok(out),
                Some(c) => out.push(c),
                None => return self.error("unterminated string"),
            }
        }
    }

    fn bare(&mut self) -> Result<String, EngineError> {
        let start = self.pos;
        while let Some(c) = self
            .peek()
            .filter(|c| !c.is_whitespace() && !"[](),\"".contains(*c))
        {
            self.pos += c.len_utf8();
        }
        if start == self.pos {
            return self.error("expected value");
        }
        Ok(self.src[start..self.pos].to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WGS84: &str = "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563,AUTHORITY[\"EPSG\",\"7030\"]]],PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433],AUTHORITY[\"EPSG\",\"4326\"]]";

    #[test]
    fn parse_and_write_back() {
        let mut text = WGS84;
        let node = parse(&mut text).unwrap();
        assert!(text.is_empty());
        assert_eq!(node.to_string(), WGS84);
    }

    #[test]
    fn find_is_depth_first_and_case_insensitive() {
        let node = parse(&mut &*WGS84).unwrap();
        let spheroid = node.find("spheroid").unwrap();
        assert_eq!(spheroid.value(0).unwrap().text(), "WGS 84");
        assert_eq!(spheroid.value(1).unwrap().number(), Some(6378137.0));
        // the first AUTHORITY in document order is the spheroid's
        assert_eq!(node.find("AUTHORITY").unwrap().value(1).unwrap().text(), "7030");
    }

    #[test]
    fn parentheses_whitespace_and_bare_keywords() {
        let mut text = "GEOGCS ( \"x\" , AXIS(\"Lat\", NORTH) ) trailing";
        let node = parse(&mut text).unwrap();
        assert_eq!(text, " trailing");
        let axis = node.child("AXIS").unwrap();
        assert_eq!(axis.value(1), Some(&WktValue::Bare("NORTH".to_owned())));
    }

    #[test]
    fn escaped_quotes() {
        let node = parse(&mut "A[\"say \"\"hi\"\"\"]").unwrap();
        assert_eq!(node.value(0).unwrap().text(), "say \"hi\"");
        assert_eq!(node.to_string(), "A[\"say \"\"hi\"\"\"]");
    }

    #[test]
    fn truncated_input_is_rejected() {
        for bad in ["GEOGCS[", "GEOGCS[\"WGS 84\"", "GEOGCS[\"WGS", "[]", "GEOGCS[\"a\" \"b\"]", ""] {
            assert!(
                matches!(parse(&mut &*bad), Err(EngineError::CorruptWkt { .. })),
                "{} should not parse",
                bad
            );
        }
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let text = format!("GEOGCS[{}{}", "A[".repeat(20_000), "]".repeat(20_001));
        let mut cursor = text.as_str();
        match parse(&mut cursor) {
            Err(EngineError::CorruptWkt { message, .. }) => assert!(message.contains("nested")),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(cursor, text);

        let ok = format!("GEOGCS[{}1{}", "A[".repeat(MAX_DEPTH - 1), "]".repeat(MAX_DEPTH));
        assert!(parse(&mut ok.as_str()).is_ok());
    }

    #[test]
    fn long_input_has_no_size_limit() {
        let name = "x".repeat(20_000);
        let text = format!("GEOGCS[\"{}\"]", name);
        let node = parse(&mut text.as_str()).unwrap();
        assert_eq!(node.value(0).unwrap().text(), name);
    }
}
