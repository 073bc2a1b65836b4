use crate::application::repos::RepoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqlStateClass {
    InvalidInput,
    Timeout,
}

/// Classify a sqlx failure by Postgres SQLSTATE where one is available.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => {
            let class = db.code().as_deref().and_then(classify_sqlstate);
            match class {
                Some(SqlStateClass::InvalidInput) => RepoError::InvalidInput {
                    message: db.message().to_string(),
                },
                Some(SqlStateClass::Timeout) => RepoError::Timeout,
                None => RepoError::from_persistence(db),
            }
        }
        other => RepoError::from_persistence(other),
    }
}

fn classify_sqlstate(code: &str) -> Option<SqlStateClass> {
    match code {
        // invalid_text_representation, datetime_field_overflow,
        // invalid_datetime_format, undefined_function (operator type mismatch)
        "22P02" | "22008" | "22007" | "42883" => Some(SqlStateClass::InvalidInput),
        // query_canceled
        "57014" => Some(SqlStateClass::Timeout),
        _ => None,
    }
}
