use std::fmt;

/// A set of tables of the query, one bit per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TableSet(u64);

impl TableSet {
    pub const EMPTY: TableSet = TableSet(0);
    pub const MAX_TABLES: usize = 64;

    /// # Panics
    /// If `offset` is not below [`TableSet::MAX_TABLES`]. The builder never
    /// hands out such offsets.
    pub fn single(offset: usize) -> Self {
        assert!(offset < Self::MAX_TABLES, "table offset {} out of range", offset);
        TableSet(1 << offset)
    }

    pub fn merge(self, other: TableSet) -> TableSet {
        TableSet(self.0 | other.0)
    }

    /// True when every table in `self` is also in `other`.
    pub fn is_solved_by(self, other: TableSet) -> bool {
        self.0 & other.0 == self.0
    }

    pub fn is_overlapping(self, other: TableSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn num_tables(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn table_offset(self) -> Option<usize> {
        if self.num_tables() == 1 {
            Some(self.0.trailing_zeros() as usize)
        } else {
            None
        }
    }

    pub fn offsets(self) -> impl Iterator<Item = usize> {
        (0..Self::MAX_TABLES).filter(move |i| self.0 & (1 << i) != 0)
    }
}

impl fmt::Display for TableSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offsets: Vec<String> = self.offsets().map(|o| o.to_string()).collect();
        write!(f, "TableSet{{{}}}", offsets.join(","))
    }
}
