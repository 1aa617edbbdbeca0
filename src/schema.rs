// Stockroom - Schema-level closed sets
// Each enumeration is declared exactly once here; the SQLite CHECK constraints
// and the HTTP listing are both derived from the same declaration, so the
// store and the application cannot drift apart.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Enumeration name served by `GET /api/units`.
pub const UNITS_OF_MEASURE: &str = "units-of-measure";

/// Enumeration backing the `users.role` column.
pub const USER_ROLES: &str = "user-roles";

// ============================================================================
// UNIT OF MEASURE
// ============================================================================

/// How a stocked material is counted or measured.
///
/// Closed set, fixed at deployment time. Members are serialized as their
/// uppercase wire tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitOfMeasure {
    Piece,
    Meter,
    Kilogram,
    Liter,
    Set,
    Pack,
}

impl UnitOfMeasure {
    /// Every member, in declaration order. The listing order and the `CHECK`
    /// constraint on `materials.unit` both come from this array.
    pub const ALL: [UnitOfMeasure; 6] = [
        UnitOfMeasure::Piece,
        UnitOfMeasure::Meter,
        UnitOfMeasure::Kilogram,
        UnitOfMeasure::Liter,
        UnitOfMeasure::Set,
        UnitOfMeasure::Pack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitOfMeasure::Piece => "PIECE",
            UnitOfMeasure::Meter => "METER",
            UnitOfMeasure::Kilogram => "KILOGRAM",
            UnitOfMeasure::Liter => "LITER",
            UnitOfMeasure::Set => "SET",
            UnitOfMeasure::Pack => "PACK",
        }
    }

    pub fn parse(token: &str) -> Option<UnitOfMeasure> {
        Self::ALL.iter().find(|unit| unit.as_str() == token).copied()
    }

    /// Wire tokens in declaration order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(UnitOfMeasure::as_str).collect()
    }
}

impl FromSql for UnitOfMeasure {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        UnitOfMeasure::parse(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown unit of measure `{text}`").into()))
    }
}

// ============================================================================
// USER ROLE
// ============================================================================

/// What an account is allowed to see. Closed set, serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Warehouse,
    Maintenance,
}

impl Role {
    /// Every member, in declaration order. Drives the `CHECK` constraint on
    /// `users.role` and the enumeration listing.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Warehouse, Role::Maintenance];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Warehouse => "warehouse",
            Role::Maintenance => "maintenance",
        }
    }

    pub fn parse(token: &str) -> Option<Role> {
        Self::ALL.iter().find(|role| role.as_str() == token).copied()
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Role::as_str).collect()
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Role::parse(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown role `{text}`").into()))
    }
}

// ============================================================================
// ENUMERATION LISTING
// ============================================================================

/// All members of a named enumeration, in declaration order.
///
/// Unknown names fail loudly rather than degrade to an empty sequence: an
/// unknown name is a bug in the caller, not a state of the data.
pub fn enumeration_values(name: &str) -> Result<Vec<&'static str>, ApiError> {
    match name {
        UNITS_OF_MEASURE => Ok(UnitOfMeasure::names()),
        USER_ROLES => Ok(Role::names()),
        other => Err(ApiError::UnknownEnumeration(other.to_string())),
    }
}

/// SQL fragment `CHECK (<column> IN ('a', 'b', ...))` for one closed set.
pub fn check_in_clause(column: &str, values: &[&str]) -> String {
    let quoted: Vec<String> = values.iter().map(|value| format!("'{value}'")).collect();
    format!("CHECK ({column} IN ({}))", quoted.join(", "))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn units_are_nonempty_and_duplicate_free() {
        let names = UnitOfMeasure::names();
        assert!(!names.is_empty());

        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn units_follow_declaration_order() {
        assert_eq!(
            UnitOfMeasure::names(),
            vec!["PIECE", "METER", "KILOGRAM", "LITER", "SET", "PACK"]
        );
    }

    #[test]
    fn roles_are_nonempty_and_duplicate_free() {
        let names = Role::names();
        assert!(!names.is_empty());

        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn roles_follow_declaration_order() {
        assert_eq!(Role::names(), vec!["admin", "warehouse", "maintenance"]);
    }

    #[test]
    fn listing_is_idempotent_within_a_process() {
        let first = enumeration_values(UNITS_OF_MEASURE).unwrap();
        let second = enumeration_values(UNITS_OF_MEASURE).unwrap();
        assert_eq!(first, second);

        let first = enumeration_values(USER_ROLES).unwrap();
        let second = enumeration_values(USER_ROLES).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_enumeration_is_rejected_not_empty() {
        let result = enumeration_values("units-of-mass");
        assert!(matches!(result, Err(ApiError::UnknownEnumeration(name)) if name == "units-of-mass"));
    }

    #[test]
    fn parse_round_trips_every_member() {
        for unit in UnitOfMeasure::ALL {
            assert_eq!(UnitOfMeasure::parse(unit.as_str()), Some(unit));
        }
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(UnitOfMeasure::parse("FURLONG"), None);
        assert_eq!(Role::parse("manager"), None);
    }

    #[test]
    fn serde_tokens_match_schema_tokens() {
        assert_eq!(
            serde_json::to_string(&UnitOfMeasure::Kilogram).unwrap(),
            "\"KILOGRAM\""
        );
        assert_eq!(serde_json::to_string(&Role::Warehouse).unwrap(), "\"warehouse\"");

        let unit: UnitOfMeasure = serde_json::from_str("\"METER\"").unwrap();
        assert_eq!(unit, UnitOfMeasure::Meter);
    }

    #[test]
    fn check_clause_quotes_every_member() {
        let clause = check_in_clause("unit", &UnitOfMeasure::names());
        assert!(clause.starts_with("CHECK (unit IN ("));
        for unit in UnitOfMeasure::ALL {
            assert!(clause.contains(&format!("'{}'", unit.as_str())));
        }
    }
}
