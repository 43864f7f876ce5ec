//! Type definitions for imported recipient data.

/// One parsed data row: column name to cell value, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    fields: Vec<(String, String)>,
}

impl RowRecord {
    /// Build a row from `(column, value)` pairs. A repeated column keeps its
    /// first position and takes the last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields: Vec<(String, String)> = Vec::new();
        for (k, v) in pairs {
            let (k, v) = (k.into(), v.into());
            match fields.iter_mut().find(|(name, _)| *name == k) {
                Some(existing) => existing.1 = v,
                None => fields.push((k, v)),
            }
        }
        Self { fields }
    }

    /// Value of a column, if the row has it.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ordered, distinct column names of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    names: Vec<String>,
}

impl ColumnSet {
    /// Build a column set, renaming repeated headers to `name_1`, `name_2`, ...
    pub fn from_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for header in headers {
            let header = header.into();
            let mut candidate = header.clone();
            let mut suffix = 1;
            while names.contains(&candidate) {
                candidate = format!("{}_{}", header, suffix);
                suffix += 1;
            }
            names.push(candidate);
        }
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Placeholder tokens for every column, in column order.
    pub fn placeholders(&self) -> Vec<String> {
        self.names.iter().map(|n| format!("{{{{{}}}}}", n)).collect()
    }
}

/// Result of a successful import: the header plus all data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSet {
    pub columns: ColumnSet,
    pub rows: Vec<RowRecord>,
}
