// Stockroom - Entity models
// Named entities share one record shape across kinds; materials and users
// carry schema-constrained columns of their own.

pub mod material;
pub mod user;

use serde::{Deserialize, Serialize};

pub use material::Material;
pub use user::User;

/// Closed set of named-entity kinds the repository can list.
///
/// Adding a kind means adding a variant here and nothing else: the table
/// name, wire token, and backing DDL are all derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Repairman,
    Buyer,
    Supplier,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Repairman,
        EntityKind::Buyer,
        EntityKind::Supplier,
    ];

    /// Backing table. Every table shares the `(id, name)` named-entity shape.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Repairman => "repair_men",
            EntityKind::Buyer => "buyers",
            EntityKind::Supplier => "suppliers",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Repairman => "repairman",
            EntityKind::Buyer => "buyer",
            EntityKind::Supplier => "supplier",
        }
    }

    /// Parse a CLI/CSV kind token.
    pub fn parse(token: &str) -> Option<EntityKind> {
        Self::ALL.iter().find(|kind| kind.as_str() == token).copied()
    }
}

/// A persisted record with a stable identity and a display name.
///
/// The identifier is assigned once at creation and never changes; the name
/// can change and carries no uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub id: String,
    pub name: String,
}

impl NamedEntity {
    /// New entity with a fresh UUID identity.
    pub fn new(name: impl Into<String>) -> Self {
        NamedEntity {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn new_entities_get_nonempty_unique_ids() {
        let ids: HashSet<String> = (0..50)
            .map(|i| NamedEntity::new(format!("entity {i}")).id)
            .collect();

        assert_eq!(ids.len(), 50);
        assert!(ids.iter().all(|id| !id.is_empty()));
    }

    #[test]
    fn kind_tokens_and_tables_are_distinct() {
        let tokens: HashSet<&str> = EntityKind::ALL.iter().map(EntityKind::as_str).collect();
        let tables: HashSet<&str> = EntityKind::ALL.iter().map(EntityKind::table).collect();

        assert_eq!(tokens.len(), EntityKind::ALL.len());
        assert_eq!(tables.len(), EntityKind::ALL.len());
    }

    #[test]
    fn kind_parse_round_trips() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("janitor"), None);
    }

    #[test]
    fn entity_serializes_as_plain_id_name_record() {
        let entity = NamedEntity {
            id: "abc-123".to_string(),
            name: "Dnipro Metals".to_string(),
        };

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json, serde_json::json!({"id": "abc-123", "name": "Dnipro Metals"}));
    }
}
