//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 전역 연결 싱글톤은 없습니다. 모든 함수는 `&SqlitePool`이나
//! 트랜잭션 안의 `&mut SqliteConnection`을 호출자로부터 명시적으로 받습니다.
//!
//! 각 하위 모듈:
//! - `departments`: 부서 CRUD와 통계, 부서 삭제 연쇄 단계
//! - `documents`: 문서 메타데이터와 문서 삭제 단계
//! - `procedures`: 절차 CRUD와 절차-문서 연결 테이블
//! - `subprocesses`: 하위 프로세스 CRUD
//! - `users`: 구성원/부서장 관계
//! - `versions`: 버전 바이트 저장소 (비즈니스 로직 없음)

pub mod departments;
pub mod documents;
pub mod procedures;
pub mod subprocesses;
pub mod users;
pub mod versions;

pub use departments::*;
pub use documents::*;
pub use procedures::*;
pub use subprocesses::*;
pub use users::*;
pub use versions::*;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// SQLite 연결 풀을 만듭니다. 파일이 없으면 생성하고 외래키 제약을 켭니다.
///
/// 쓰기는 SQLite가 한 번에 하나씩만 허용하므로, 잠금을 기다리는 시간(busy_timeout)을 둡니다.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// `./migrations`의 SQL 파일 중 아직 적용되지 않은 것을 순서대로 실행합니다.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// 현재 시각을 DB 기본값과 같은 형식으로 만드는 SQL 식
pub(crate) const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

#[cfg(test)]
pub(crate) mod test_support {
    //! 테스트마다 임시 디렉토리에 새 SQLite 파일을 만들고 마이그레이션합니다.

    use super::*;
    use crate::models::*;
    use tempfile::TempDir;

    pub struct TestDb {
        pub pool: SqlitePool,
        _dir: TempDir,
    }

    pub async fn test_db() -> TestDb {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("test.db").display());
        let pool = connect(&url, 5).await.unwrap();
        migrate(&pool).await.unwrap();
        TestDb { pool, _dir: dir }
    }

    pub async fn seed_user(pool: &SqlitePool, name: &str, department_id: Option<i64>) -> User {
        users::create_user(
            pool,
            &CreateUserRequest {
                name: name.to_string(),
                email: None,
                role: None,
                department_id,
            },
        )
        .await
        .unwrap()
    }

    pub async fn seed_department(pool: &SqlitePool, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO departments (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    pub async fn seed_subprocess(pool: &SqlitePool, name: &str, department_id: i64) -> i64 {
        sqlx::query_scalar("INSERT INTO subprocesses (name, department_id) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(department_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    pub async fn seed_procedure(
        pool: &SqlitePool,
        title: &str,
        subprocess_id: i64,
        responsible_id: i64,
    ) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO procedures (title, subprocess_id, responsible_id, created_by) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(title)
        .bind(subprocess_id)
        .bind(responsible_id)
        .bind(responsible_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    pub async fn seed_document(pool: &SqlitePool, name: &str) -> i64 {
        documents::create_document(
            pool,
            &CreateDocumentRequest {
                name: name.to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    pub async fn count(pool: &SqlitePool, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
    }
}
