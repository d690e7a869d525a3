use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    db::{Database, Param, Row},
    error::DbError,
    schema::TodoPayload,
};

const CREATE_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    done BOOLEAN NOT NULL DEFAULT 0,
    createdon TIMESTAMP NOT NULL,
    updatedon TIMESTAMP NOT NULL
);"#;

const INSERT_TODO: &str = "INSERT INTO todos (text, done, createdon, updatedon) \
     VALUES (?, ?, current_timestamp, current_timestamp) RETURNING id, createdon";
const SELECT_TODO: &str = "SELECT text, done, createdon FROM todos WHERE id = ?";
const SELECT_PAGE: &str = "SELECT id, text, done, createdon FROM todos LIMIT ? OFFSET ?";
const UPDATE_TODO: &str = "UPDATE todos SET text = ?, done = ?, updatedon = current_timestamp \
     WHERE id = ? RETURNING createdon";
const DELETE_TODO: &str = "DELETE FROM todos WHERE id = ?";

// Data model representing a Todo item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Todo {
    pub done: bool,
    #[serde(rename = "ID")]
    pub id: i64,
    pub text: String,
    pub created_on: DateTime<Utc>,
}

/// `0001-01-01T00:00:00Z`, reported for a todo whose row does not exist.
pub fn zero_time() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(DateTime::<Utc>::MIN_UTC, |naive| naive.and_utc())
}

impl Todo {
    fn from_page_row(row: &Row) -> Result<Self, DbError> {
        Ok(Todo {
            id: row.get_i64(0)?,
            text: row.get_string(1)?,
            done: row.get_bool(2)?,
            created_on: row.get_timestamp(3)?,
        })
    }
}

/// Translates todo operations into single parameterized statements.
pub struct TodoRepository<'a> {
    db: &'a dyn Database,
}

impl<'a> TodoRepository<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Creates the `todos` table if it is missing.
    pub async fn ensure_schema(&self) -> Result<(), DbError> {
        self.db.execute(CREATE_TABLE, &[]).await.map(|_| ())
    }

    /// Inserts a todo; the database assigns `id` and `created_on`.
    pub async fn create(&self, payload: TodoPayload) -> Result<Todo, DbError> {
        let row = self
            .db
            .query_row(
                INSERT_TODO,
                &[Param::Text(payload.text.clone()), Param::Bool(payload.done)],
            )
            .await?;

        Ok(Todo {
            id: row.get_i64(0)?,
            text: payload.text,
            done: payload.done,
            created_on: row.get_timestamp(1)?,
        })
    }

    /// Fails with [`DbError::NoRows`] when no todo has this id.
    pub async fn get(&self, id: i64) -> Result<Todo, DbError> {
        let row = self.db.query_row(SELECT_TODO, &[Param::Int(id)]).await?;
        Ok(Todo {
            id,
            text: row.get_string(0)?,
            done: row.get_bool(1)?,
            created_on: row.get_timestamp(2)?,
        })
    }

    pub async fn list(&self, start: i64, count: i64) -> Result<Vec<Todo>, DbError> {
        let rows = self
            .db
            .query_rows(SELECT_PAGE, &[Param::Int(count), Param::Int(start)])
            .await?;
        rows.iter().map(Todo::from_page_row).collect()
    }

    /// Overwrites `text` and `done` and returns the stored creation time, or
    /// `None` when no todo has this id.
    pub async fn update(
        &self,
        id: i64,
        payload: &TodoPayload,
    ) -> Result<Option<DateTime<Utc>>, DbError> {
        let updated = self
            .db
            .query_row(
                UPDATE_TODO,
                &[
                    Param::Text(payload.text.clone()),
                    Param::Bool(payload.done),
                    Param::Int(id),
                ],
            )
            .await;

        match updated {
            Ok(row) => Ok(Some(row.get_timestamp(0)?)),
            Err(DbError::NoRows) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<u64, DbError> {
        self.db.execute(DELETE_TODO, &[Param::Int(id)]).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{
        mock::{MockDatabase, Reply},
        Value,
    };

    fn payload(text: &str, done: bool) -> TodoPayload {
        TodoPayload {
            text: text.to_string(),
            done,
        }
    }

    #[tokio::test]
    async fn create_reads_back_generated_id_and_timestamp() {
        let db = MockDatabase::with_replies([Reply::Rows(vec![Row::new(vec![
            Value::Int(1),
            Value::Text("2024-01-02 03:04:05".into()),
        ])])]);

        let todo = TodoRepository::new(&db)
            .create(payload("test todo", false))
            .await
            .unwrap();

        assert_eq!(todo.id, 1);
        assert_eq!(todo.text, "test todo");
        assert!(!todo.done);
        assert_eq!(
            todo.created_on.to_rfc3339(),
            "2024-01-02T03:04:05+00:00"
        );
        assert_eq!(
            db.calls(),
            vec![(
                INSERT_TODO.to_string(),
                vec![Param::Text("test todo".into()), Param::Bool(false)]
            )]
        );
    }

    #[tokio::test]
    async fn get_propagates_no_rows() {
        let db = MockDatabase::default();
        let err = TodoRepository::new(&db).get(11).await.unwrap_err();
        assert!(matches!(err, DbError::NoRows));
        assert_eq!(db.calls()[0].1, vec![Param::Int(11)]);
    }

    #[tokio::test]
    async fn list_binds_limit_before_offset() {
        let db = MockDatabase::with_replies([Reply::Rows(vec![
            Row::new(vec![
                Value::Int(3),
                Value::Text("a".into()),
                Value::Int(0),
                Value::Text("2024-01-02 03:04:05".into()),
            ]),
            Row::new(vec![
                Value::Int(4),
                Value::Text("b".into()),
                Value::Int(1),
                Value::Text("2024-01-02 03:04:06".into()),
            ]),
        ])]);

        let todos = TodoRepository::new(&db).list(2, 5).await.unwrap();

        assert_eq!(
            todos.iter().map(|t| (t.id, t.done)).collect::<Vec<_>>(),
            vec![(3, false), (4, true)]
        );
        assert_eq!(db.calls()[0].1, vec![Param::Int(5), Param::Int(2)]);
    }

    #[tokio::test]
    async fn update_reads_back_creation_time() {
        let db = MockDatabase::with_replies([Reply::Rows(vec![Row::new(vec![Value::Text(
            "2024-01-02 03:04:05".into(),
        )])])]);

        let created_on = TodoRepository::new(&db)
            .update(9, &payload("updated", true))
            .await
            .unwrap();

        assert_eq!(
            created_on.map(|at| at.to_rfc3339()),
            Some("2024-01-02T03:04:05+00:00".to_string())
        );
    }

    #[tokio::test]
    async fn update_targets_path_id_and_never_writes_created_on() {
        let db = MockDatabase::default();

        let created_on = TodoRepository::new(&db)
            .update(9, &payload("updated", true))
            .await
            .unwrap();

        assert_eq!(created_on, None);
        let calls = db.calls();
        let (statement, params) = &calls[0];
        assert!(!statement.contains("createdon ="));
        assert_eq!(
            params,
            &vec![
                Param::Text("updated".into()),
                Param::Bool(true),
                Param::Int(9)
            ]
        );
    }

    #[tokio::test]
    async fn delete_surfaces_storage_failures() {
        let db = MockDatabase::with_replies([Reply::Fail("disk I/O error".into())]);
        let err = TodoRepository::new(&db).delete(1).await.unwrap_err();
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn todo_serializes_with_wire_field_names() {
        let todo = Todo {
            id: 1,
            text: "milk".into(),
            done: true,
            created_on: zero_time(),
        };
        assert_eq!(
            serde_json::to_value(&todo).unwrap(),
            serde_json::json!({
                "done": true,
                "ID": 1,
                "text": "milk",
                "created_on": "0001-01-01T00:00:00Z"
            })
        );
    }
}
