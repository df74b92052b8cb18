/// Presentation class of a column, resolved to a terminal style at render
/// time (the word column is highlighted, extras are dimmed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    Word,
    Definition,
    Extra,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub header: &'static str,
    pub class: ColumnClass,
}

/// Identity and schema of one remote table. Immutable for a session;
/// selectable among the fixed registry below.
#[derive(Debug)]
pub struct DatasetDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub config: &'static str,
    pub split: &'static str,
    pub columns: &'static [ColumnSpec],
}

pub const DATASETS: &[DatasetDescriptor] = &[
    DatasetDescriptor {
        key: "alpaca",
        name: "vislupus/alpaca-bulgarian-dictionary",
        config: "default",
        split: "train",
        columns: &[
            ColumnSpec {
                key: "input",
                header: "Дума (Word)",
                class: ColumnClass::Word,
            },
            ColumnSpec {
                key: "instruction",
                header: "Въпрос (Question)",
                class: ColumnClass::Definition,
            },
            ColumnSpec {
                key: "output",
                header: "Отговор (Answer)",
                class: ColumnClass::Extra,
            },
        ],
    },
    DatasetDescriptor {
        key: "bogko",
        name: "thebogko/bulgarian-dictionary-2024",
        config: "default",
        split: "train",
        columns: &[
            ColumnSpec {
                key: "word",
                header: "Дума (Word)",
                class: ColumnClass::Word,
            },
            ColumnSpec {
                key: "tag",
                header: "Етикет (Tag)",
                class: ColumnClass::Definition,
            },
        ],
    },
];

pub fn find(key: &str) -> Option<&'static DatasetDescriptor> {
    DATASETS.iter().find(|ds| ds.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_known_datasets() {
        assert_eq!(find("alpaca").unwrap().columns.len(), 3);
        assert_eq!(find("bogko").unwrap().columns.len(), 2);
        assert!(find("nope").is_none());
    }

    #[test]
    fn registry_keys_are_unique() {
        let mut keys: Vec<&str> = DATASETS.iter().map(|ds| ds.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), DATASETS.len());
    }
}
