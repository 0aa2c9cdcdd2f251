use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Patient,
    Doctor,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Patient => "patient",
            UserType::Doctor => "doctor",
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(UserType::Patient),
            "doctor" => Ok(UserType::Doctor),
            other => Err(DatabaseError::InvalidEnum {
                field: "user_type".into(),
                value: other.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub specialty: Option<String>,
}

pub fn insert_user(conn: &Connection, user: &UserRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (email, first_name, last_name, user_type, specialty)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.email.to_lowercase(),
            user.first_name,
            user.last_name,
            user.user_type.as_str(),
            user.specialty,
        ],
    )?;
    Ok(())
}

/// User by email (case-insensitive) and role.
pub fn get_user(
    conn: &Connection,
    email: &str,
    user_type: UserType,
) -> Result<Option<UserRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT email, first_name, last_name, user_type, specialty
             FROM users WHERE email = ?1 COLLATE NOCASE AND user_type = ?2",
            params![email, user_type.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )
        .optional()?;

    row.map(
        |(email, first_name, last_name, user_type, specialty)| -> Result<UserRecord, DatabaseError> {
            Ok(UserRecord {
                email,
                first_name,
                last_name,
                user_type: user_type.parse()?,
                specialty: specialty.filter(|s| !s.trim().is_empty()),
            })
        },
    )
    .transpose()
}
