//! Constraint and index naming.
//!
//! Every name issued while rendering one script goes through a [`NameScope`],
//! which the generator creates per call and threads through explicitly.
//! Derived names are deterministic, except foreign keys: their suffix is
//! random so several unnamed keys between the same pair of tables stay
//! distinct. Regenerating a script therefore renames unnamed foreign keys.

use crate::model::{CheckConstraint, Column, ForeignKey, Index, Table, UniqueConstraint};
use md5::{Digest, Md5};
use rand::Rng;
use std::collections::HashSet;

/// Longest identifier the engine accepts.
pub const MAX_IDENTIFIER_LEN: usize = 128;
const FK_SUFFIX_LEN: usize = 8;

/// Names issued so far in one script, compared case-insensitively.
///
/// Constraint names share a namespace per schema; index names per table.
#[derive(Debug, Default)]
pub struct NameScope {
    issued: HashSet<(String, String)>,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` in `namespace`. Returns false if it was already taken.
    pub fn claim(&mut self, namespace: &str, name: &str) -> bool {
        self.issued
            .insert((namespace.to_lowercase(), name.to_lowercase()))
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.issued
            .contains(&(namespace.to_lowercase(), name.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    /// Claim a name that cannot be re-derived. A clash is logged and kept:
    /// the engine will report it when the script runs.
    fn claim_fixed(&mut self, namespace: &str, name: String) -> String {
        if !self.claim(namespace, &name) {
            tracing::warn!(namespace, name = %name, "duplicate constraint name in script");
        }
        name
    }
}

fn constraint_namespace(table: &Table) -> String {
    table.schema.trim().to_string()
}

fn index_namespace(table: &Table) -> String {
    format!("{}.{}", table.schema.trim(), table.name)
}

fn explicit(name: Option<&String>) -> Option<&str> {
    name.map(|n| n.trim()).filter(|n| !n.is_empty())
}

/// Stable numeric tag for a piece of text: the first four bytes of its MD5
/// digest, as a non-negative 31-bit number.
pub fn text_hash(text: &str) -> u32 {
    let digest = Md5::digest(text.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) & 0x7fff_ffff
}

pub fn primary_key_name(scope: &mut NameScope, table: &Table) -> String {
    let name = explicit(table.primary_key_name.as_ref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("PK_{}", table.name));
    scope.claim_fixed(&constraint_namespace(table), name)
}

pub fn default_name(scope: &mut NameScope, table: &Table, column: &Column) -> String {
    let name = format!("DF_{}_{}", table.name, column.name);
    scope.claim_fixed(&constraint_namespace(table), name)
}

pub fn column_unique_name(scope: &mut NameScope, table: &Table, column: &Column) -> String {
    let name = format!("UQ_{}_{}", table.name, column.name);
    scope.claim_fixed(&constraint_namespace(table), name)
}

pub fn check_name(scope: &mut NameScope, table: &Table, check: &CheckConstraint) -> String {
    let name = explicit(check.name.as_ref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("CK_{}_{}", table.name, text_hash(&check.expression)));
    scope.claim_fixed(&constraint_namespace(table), name)
}

pub fn unique_name(scope: &mut NameScope, table: &Table, unique: &UniqueConstraint) -> String {
    let name = explicit(unique.name.as_ref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("UQ_{}_{}", table.name, text_hash(&unique.columns_csv)));
    scope.claim_fixed(&constraint_namespace(table), name)
}

pub fn index_name(scope: &mut NameScope, table: &Table, index: &Index) -> String {
    let name = explicit(index.name.as_ref())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let columns: Vec<&str> = index
                .columns
                .iter()
                .map(|c| c.column_name.as_str())
                .collect();
            format!("IX_{}_{}", table.name, columns.join("_"))
        });
    scope.claim_fixed(&index_namespace(table), name)
}

/// `FK_<table>_<refTable>_<8 hex digits>`, at most [`MAX_IDENTIFIER_LEN`]
/// characters. The prefix is truncated, never the suffix. A suffix that
/// collides with an issued name is drawn again.
pub fn foreign_key_name<R: Rng>(
    scope: &mut NameScope,
    table: &Table,
    fk: &ForeignKey,
    rng: &mut R,
) -> String {
    let namespace = constraint_namespace(table);
    if let Some(name) = explicit(fk.name.as_ref()) {
        return scope.claim_fixed(&namespace, name.to_string());
    }

    let prefix: String = format!("FK_{}_{}", table.name, fk.ref_table)
        .chars()
        .take(MAX_IDENTIFIER_LEN - FK_SUFFIX_LEN - 1)
        .collect();

    loop {
        let suffix: u32 = rng.r#gen();
        let name = format!("{}_{:08x}", prefix, suffix);
        if scope.claim(&namespace, &name) {
            return name;
        }
        tracing::debug!(name = %name, "foreign key suffix collided, drawing again");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForeignKeyColumn, IndexColumn};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn orders() -> Table {
        Table::new("dbo", "Orders")
    }

    fn fk_to(ref_table: &str) -> ForeignKey {
        ForeignKey {
            name: None,
            ref_schema: "dbo".to_string(),
            ref_table: ref_table.to_string(),
            on_delete_action: None,
            columns: vec![ForeignKeyColumn {
                column_name: "CustomerId".to_string(),
                ref_column_name: "Id".to_string(),
            }],
        }
    }

    #[test]
    fn test_primary_key_default_and_override() {
        let mut scope = NameScope::new();
        let mut table = orders();
        assert_eq!(primary_key_name(&mut scope, &table), "PK_Orders");

        table.primary_key_name = Some("PK_Orders_Custom".to_string());
        assert_eq!(primary_key_name(&mut scope, &table), "PK_Orders_Custom");

        table.primary_key_name = Some("   ".to_string());
        let mut scope = NameScope::new();
        assert_eq!(primary_key_name(&mut scope, &table), "PK_Orders");
    }

    #[test]
    fn test_column_names() {
        let mut scope = NameScope::new();
        let table = orders();
        let column = Column::new("Total", "decimal");
        assert_eq!(default_name(&mut scope, &table, &column), "DF_Orders_Total");
        assert_eq!(column_unique_name(&mut scope, &table, &column), "UQ_Orders_Total");
        assert_eq!(scope.len(), 2);
    }

    #[test]
    fn test_hash_names_are_stable() {
        let table = orders();
        let check = CheckConstraint {
            name: None,
            expression: "[Total] >= 0".to_string(),
        };
        let first = check_name(&mut NameScope::new(), &table, &check);
        let second = check_name(&mut NameScope::new(), &table, &check);
        assert_eq!(first, second);
        assert!(first.starts_with("CK_Orders_"));
        assert_eq!(first, format!("CK_Orders_{}", text_hash("[Total] >= 0")));
    }

    #[test]
    fn test_hash_differs_by_text() {
        assert_ne!(text_hash("A, B"), text_hash("A,B"));
        assert!(text_hash("anything") <= i32::MAX as u32);
    }

    #[test]
    fn test_identical_checks_share_name() {
        let mut scope = NameScope::new();
        let table = orders();
        let check = CheckConstraint {
            name: None,
            expression: "[Total] >= 0".to_string(),
        };
        let first = check_name(&mut scope, &table, &check);
        let second = check_name(&mut scope, &table, &check);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unique_name_explicit() {
        let mut scope = NameScope::new();
        let unique = UniqueConstraint {
            name: Some("UQ_Custom".to_string()),
            columns_csv: "A,B".to_string(),
        };
        assert_eq!(unique_name(&mut scope, &orders(), &unique), "UQ_Custom");
    }

    #[test]
    fn test_index_name_joins_columns() {
        let mut scope = NameScope::new();
        let index = Index {
            name: None,
            is_unique: false,
            columns: vec![
                IndexColumn { column_name: "CustomerId".to_string(), descending: false },
                IndexColumn { column_name: "CreatedAt".to_string(), descending: true },
            ],
            include_columns_csv: None,
        };
        assert_eq!(index_name(&mut scope, &orders(), &index), "IX_Orders_CustomerId_CreatedAt");
        // index names are per table
        assert!(!scope.contains("dbo", "IX_Orders_CustomerId_CreatedAt"));
    }

    #[test]
    fn test_foreign_key_name_shape() {
        let mut scope = NameScope::new();
        let mut rng = StdRng::seed_from_u64(7);
        let name = foreign_key_name(&mut scope, &orders(), &fk_to("Customers"), &mut rng);
        let suffix = name.strip_prefix("FK_Orders_Customers_").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_foreign_key_names_distinct_for_same_pair() {
        let mut scope = NameScope::new();
        let mut rng = StdRng::seed_from_u64(1);
        let fk = fk_to("Customers");
        let a = foreign_key_name(&mut scope, &orders(), &fk, &mut rng);
        let b = foreign_key_name(&mut scope, &orders(), &fk, &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_foreign_key_name_is_seed_deterministic() {
        let fk = fk_to("Customers");
        let a = foreign_key_name(&mut NameScope::new(), &orders(), &fk, &mut StdRng::seed_from_u64(42));
        let b = foreign_key_name(&mut NameScope::new(), &orders(), &fk, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_foreign_key_name_is_bounded() {
        let mut scope = NameScope::new();
        let mut rng = StdRng::seed_from_u64(3);
        let table = Table::new("dbo", "T".repeat(200));
        let name = foreign_key_name(&mut scope, &table, &fk_to(&"R".repeat(200)), &mut rng);
        assert_eq!(name.chars().count(), MAX_IDENTIFIER_LEN);
        assert_eq!(name.rsplit('_').next().unwrap().len(), 8);
    }

    #[test]
    fn test_foreign_key_explicit_name() {
        let mut scope = NameScope::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut fk = fk_to("Customers");
        fk.name = Some("FK_Orders_Customer".to_string());
        assert_eq!(
            foreign_key_name(&mut scope, &orders(), &fk, &mut rng),
            "FK_Orders_Customer"
        );
    }
}
