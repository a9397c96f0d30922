//! Text layout helpers shared by the script renderers.

/// One indentation step in generated scripts
pub const TAB: &str = "    ";

/// Name suffix for a per-table counter: the first occurrence is unsuffixed.
pub fn suffix(counter: u32) -> String {
    if counter <= 1 {
        String::new()
    } else {
        counter.to_string()
    }
}

/// Padding after `text` so the next element starts near column `min_spacing`.
///
/// Text that fills or overruns the budget gets two spaces.
pub fn spacing(text: &str, min_spacing: usize) -> String {
    let len = text.chars().count();
    if len >= min_spacing {
        " ".repeat(2)
    } else {
        " ".repeat(min_spacing - len)
    }
}

/// Double single quotes for use inside a SQL string literal.
pub fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Zero-padded table number used as the file name prefix.
pub fn file_prefix(table_number: u32) -> String {
    format!("{:03}", table_number)
}

/// Soft line wrap for long comma lists.
///
/// A break is due once the running text reaches the next multiple of the budget.
#[derive(Debug)]
pub struct SoftWrap {
    budget: usize,
    count: usize,
}

impl SoftWrap {
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
            count: 1,
        }
    }

    pub fn should_break(&mut self, current_len: usize) -> bool {
        if current_len >= self.budget * self.count {
            self.count += 1;
            true
        } else {
            false
        }
    }
}

/// Per-table naming counter; yields 1, 2, 3…
#[derive(Debug)]
pub struct Counter(u32);

impl Default for Counter {
    fn default() -> Self {
        Counter(1)
    }
}

impl Counter {
    pub fn next_value(&mut self) -> u32 {
        let current = self.0;
        self.0 += 1;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_rule() {
        assert_eq!(suffix(1), "");
        assert_eq!(suffix(2), "2");
        assert_eq!(suffix(11), "11");
    }

    #[test]
    fn test_spacing() {
        assert_eq!(spacing("ID", 6), "    ");
        assert_eq!(spacing("ABCDEFGH", 6), "  ");
        assert_eq!(spacing("ABCDEF", 6), "  ");
        assert_eq!(spacing("", 0), "  ");
    }

    #[test]
    fn test_soft_wrap_breaks_on_multiples() {
        let mut wrap = SoftWrap::new(10);
        assert!(!wrap.should_break(9));
        assert!(wrap.should_break(10));
        assert!(!wrap.should_break(19));
        assert!(wrap.should_break(20));
    }

    #[test]
    fn test_counter_and_escape() {
        let mut c = Counter::default();
        assert_eq!((c.next_value(), c.next_value(), c.next_value()), (1, 2, 3));
        assert_eq!(escape_literal("Bob's order"), "Bob''s order");
        assert_eq!(file_prefix(7), "007");
    }
}
