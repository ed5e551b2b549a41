//! Parameter-indexed SQL fragments.

use std::fmt::Write as _;

use crate::driver::Value;

/// How a placeholder for parameter `n` (1-based) is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?1`, `?2`, … (SQLite)
    QuestionNumbered,
    /// `$1`, `$2`, … (Postgres)
    DollarNumbered,
}

impl PlaceholderStyle {
    fn sigil(self) -> char {
        match self {
            PlaceholderStyle::QuestionNumbered => '?',
            PlaceholderStyle::DollarNumbered => '$',
        }
    }

    pub fn placeholder(self, index: usize) -> String {
        format!("{}{}", self.sigil(), index)
    }

    /// Count placeholders in `sql`, ignoring anything inside string literals.
    pub fn count_placeholders(self, sql: &str) -> usize {
        let sigil = self.sigil();
        let mut count = 0;
        let mut in_literal = false;
        let mut chars = sql.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                in_literal = !in_literal;
            } else if !in_literal && c == sigil && chars.peek().is_some_and(|n| n.is_ascii_digit())
            {
                count += 1;
            }
        }
        count
    }
}

/// A piece of statement text together with the values its placeholders bind.
///
/// Structural text goes in through [`push_sql`](Self::push_sql); data only
/// ever goes in through [`bind`](Self::bind), which emits the placeholder for
/// the current index, records the value and advances the index. Emitted
/// placeholders and recorded values therefore always match one-to-one.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFragment {
    text: String,
    params: Vec<Value>,
    next_index: usize,
    style: PlaceholderStyle,
}

impl QueryFragment {
    /// An empty fragment whose first placeholder will be `start_index`.
    pub fn new(style: PlaceholderStyle, start_index: usize) -> Self {
        Self {
            text: String::new(),
            params: Vec::new(),
            next_index: start_index.max(1),
            style,
        }
    }

    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        self.text.push_str(sql);
        self
    }

    /// Emit one placeholder bound to `value`.
    pub fn bind(&mut self, value: impl Into<Value>) -> &mut Self {
        let _ = write!(self.text, "{}{}", self.style.sigil(), self.next_index);
        self.params.push(value.into());
        self.next_index += 1;
        self
    }

    /// Emit `values.len()` placeholders separated by `", "`.
    pub fn bind_list<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) -> &mut Self {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.text.push_str(", ");
            }
            self.bind(value);
        }
        self
    }

    /// Append a fragment that was started at this fragment's `next_index`.
    ///
    /// Panics if the indices don't line up, since splicing it would misbind
    /// every later parameter.
    pub fn append(&mut self, other: QueryFragment) -> &mut Self {
        assert_eq!(
            other.start_index(),
            self.next_index,
            "fragment spliced at the wrong parameter index"
        );
        assert_eq!(other.style, self.style, "mixed placeholder styles");
        self.text.push_str(&other.text);
        self.params.extend(other.params);
        self.next_index = other.next_index;
        self
    }

    /// Start a fragment that continues from this one's index.
    pub fn continuation(&self) -> QueryFragment {
        QueryFragment::new(self.style, self.next_index)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    fn start_index(&self) -> usize {
        self.next_index - self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    pub fn finish(self) -> Statement {
        debug_assert_eq!(
            self.style.count_placeholders(&self.text),
            self.params.len(),
            "placeholder/param mismatch in {:?}",
            self.text
        );
        Statement {
            sql: self.text,
            params: self.params,
        }
    }
}

/// A complete, fully parameterized statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn placeholder_count(&self, style: PlaceholderStyle) -> usize {
        style.count_placeholders(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_advances_index() {
        let mut f = QueryFragment::new(PlaceholderStyle::QuestionNumbered, 1);
        f.push_sql("a = ").bind("x").push_sql(" AND b = ").bind(3i64);
        assert_eq!(f.text(), "a = ?1 AND b = ?2");
        assert_eq!(f.next_index(), 3);
        assert_eq!(f.params(), &[Value::from("x"), Value::from(3i64)]);
    }

    #[test]
    fn dollar_style() {
        let mut f = QueryFragment::new(PlaceholderStyle::DollarNumbered, 4);
        f.bind_list([1i64, 2, 3]);
        assert_eq!(f.text(), "$4, $5, $6");
        assert_eq!(f.next_index(), 7);
    }

    #[test]
    fn append_continues_numbering() {
        let mut head = QueryFragment::new(PlaceholderStyle::QuestionNumbered, 1);
        head.push_sql("WHERE a = ").bind(1i64);
        let mut tail = head.continuation();
        tail.push_sql(" LIMIT ").bind(10i64);
        head.append(tail);
        let stmt = head.finish();
        assert_eq!(stmt.sql, "WHERE a = ?1 LIMIT ?2");
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    #[should_panic(expected = "wrong parameter index")]
    fn append_rejects_misaligned_fragment() {
        let mut head = QueryFragment::new(PlaceholderStyle::QuestionNumbered, 1);
        head.bind(1i64);
        let mut stale = QueryFragment::new(PlaceholderStyle::QuestionNumbered, 1);
        stale.bind(2i64);
        head.append(stale);
    }

    #[test]
    fn count_ignores_literals() {
        let style = PlaceholderStyle::QuestionNumbered;
        assert_eq!(style.count_placeholders("a = ?1 AND b = '?2' AND c = ?3"), 2);
        assert_eq!(style.count_placeholders("a LIKE ?1 ESCAPE '\\'"), 1);
        assert_eq!(style.count_placeholders("no params"), 0);
    }
}
