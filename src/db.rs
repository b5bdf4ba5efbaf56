use crate::config::DatabaseConfig;
use crate::error::ApiError;
use crate::models::joke::CUSTOM_SOURCE;
use crate::models::{Joke, NewJoke, Topic, User, UserSummary};
use crate::store::JokeStore;
use async_trait::async_trait;
use deadpool_postgres::{Config, Object, Pool, PoolConfig, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::Row;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Jokes joined with their creator and aggregated topic names.
/// Callers append `WHERE`, then `GROUP BY j.id, u.id` and ordering.
const JOKE_SELECT: &str = r#"
    SELECT j.id, j.number, j.text, j.source, j.created_at, j.updated_at,
           u.id, u.name,
           COALESCE(
               ARRAY_AGG(t.name::TEXT ORDER BY t.name) FILTER (WHERE t.id IS NOT NULL),
               ARRAY[]::TEXT[]
           ) AS topics
    FROM jokes j
    LEFT JOIN users u ON u.id = j.user_id
    LEFT JOIN joke_topics jt ON jt.joke_id = j.id
    LEFT JOIN topics t ON t.id = jt.topic_id
"#;

const JOKE_GROUP_BY: &str = "GROUP BY j.id, u.id";

const SEED_USERS: [&str; 4] = ["Manolito", "Pepe", "Isabel", "Pedro"];
const SEED_TOPICS: [&str; 3] = ["humor negro", "humor amarillo", "chistes verdes"];
const SEED_JOKES_PER_PAIR: usize = 3;

/// PostgreSQL への接続プールを握るリポジトリ層。
/// `JokeStore` トレイトを実装し、サービス層からは `Arc<dyn JokeStore>` として見える。
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// 接続プールを構築し、起動時に疎通確認まで実施する。
    pub async fn new(config: DatabaseConfig) -> Result<Self, ApiError> {
        info!("Creating PostgreSQL connection pool for host: {}:{}", config.host, config.port);

        let pool = Self::create_pool(config)?;

        let db = Database { pool };
        db.health_check().await?;
        info!("Database connection test successful");

        Ok(db)
    }

    fn create_pool(config: DatabaseConfig) -> Result<Pool, ApiError> {
        let mut pg_config = Config::new();

        pg_config.host = Some(config.host);
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database);
        pg_config.user = Some(config.username);
        pg_config.password = Some(config.password);

        pg_config.ssl_mode = Some(match config.ssl_mode.as_str() {
            "disable" => deadpool_postgres::SslMode::Disable,
            "require" => deadpool_postgres::SslMode::Require,
            "prefer" => deadpool_postgres::SslMode::Prefer,
            other => {
                warn!("Unknown SSL mode '{}', defaulting to 'prefer'", other);
                deadpool_postgres::SslMode::Prefer
            }
        });

        pg_config.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(config.max_connections as usize);
        pool_config.timeouts.wait = Some(config.connection_timeout);
        pool_config.timeouts.create = Some(config.connection_timeout);
        pg_config.pool = Some(pool_config);

        let tls_connector = TlsConnector::builder().build().map_err(|e| {
            error!("Failed to create TLS connector: {}", e);
            ApiError::Database(format!("TLS connector creation failed: {}", e))
        })?;
        let tls = MakeTlsConnector::new(tls_connector);

        pg_config.create_pool(Some(Runtime::Tokio1), tls).map_err(|e| {
            error!("Failed to create connection pool: {}", e);
            ApiError::Database(format!("Connection pool creation failed: {}", e))
        })
    }

    async fn get_connection(&self) -> Result<Object, ApiError> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// アプリ起動時にテーブル群を CREATE する簡易マイグレーター。
    /// `jokes.number` は `SERIAL` なので、採番は DB 側に任せている。
    pub async fn migrate(&self) -> Result<(), ApiError> {
        info!("Running database migrations");

        let client = self.get_connection().await?;

        let statements: [(&str, &str); 7] = [
            ("uuid extension", r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#),
            (
                "users table",
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id UUID PRIMARY KEY DEFAULT uuid_generate_v4(),
                    name VARCHAR(100) UNIQUE NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
            ),
            (
                "topics table",
                r#"
                CREATE TABLE IF NOT EXISTS topics (
                    id UUID PRIMARY KEY DEFAULT uuid_generate_v4(),
                    name VARCHAR(100) UNIQUE NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
            ),
            (
                "jokes table",
                r#"
                CREATE TABLE IF NOT EXISTS jokes (
                    id UUID PRIMARY KEY DEFAULT uuid_generate_v4(),
                    number SERIAL UNIQUE NOT NULL,
                    text TEXT NOT NULL,
                    source VARCHAR(50),
                    user_id UUID REFERENCES users(id) ON DELETE SET NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
            ),
            (
                "joke_topics table",
                r#"
                CREATE TABLE IF NOT EXISTS joke_topics (
                    joke_id UUID NOT NULL REFERENCES jokes(id) ON DELETE CASCADE,
                    topic_id UUID NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
                    PRIMARY KEY (joke_id, topic_id)
                )
                "#,
            ),
            (
                "jokes user_id index",
                "CREATE INDEX IF NOT EXISTS idx_jokes_user_id ON jokes(user_id)",
            ),
            (
                "joke_topics topic_id index",
                "CREATE INDEX IF NOT EXISTS idx_joke_topics_topic_id ON joke_topics(topic_id)",
            ),
        ];

        for (name, statement) in statements {
            client.execute(statement, &[]).await.map_err(|e| {
                error!("Failed to create {}: {}", name, e);
                ApiError::Database(format!("Migration step '{}' failed: {}", name, e))
            })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// 開発用のシードデータを投入する。
    /// ユーザーが既に存在する場合は何もしないことで、重複挿入を避けている。
    pub async fn seed(&self) -> Result<(), ApiError> {
        info!("Seeding users, topics and jokes");

        let mut client = self.get_connection().await?;

        let row = client.query_one("SELECT COUNT(*) FROM users", &[]).await?;
        let existing: i64 = row.get(0);
        if existing > 0 {
            info!("Users table already contains {} entries, skipping seed", existing);
            return Ok(());
        }

        let tx = client.transaction().await?;

        let mut users = Vec::with_capacity(SEED_USERS.len());
        for name in SEED_USERS {
            let row = tx
                .query_one("INSERT INTO users (name) VALUES ($1) RETURNING id", &[&name])
                .await?;
            users.push((row.get::<_, Uuid>(0), name));
        }

        let mut topics = Vec::with_capacity(SEED_TOPICS.len());
        for name in SEED_TOPICS {
            let row = tx
                .query_one("INSERT INTO topics (name) VALUES ($1) RETURNING id", &[&name])
                .await?;
            topics.push((row.get::<_, Uuid>(0), name));
        }

        let mut joke_count = 0;
        for (user_id, user_name) in &users {
            for (topic_id, topic_name) in &topics {
                for i in 1..=SEED_JOKES_PER_PAIR {
                    let text = format!("Este es el chiste {} de {} por {}", i, topic_name, user_name);
                    let row = tx
                        .query_one(
                            "INSERT INTO jokes (text, source, user_id) VALUES ($1, $2, $3) RETURNING id",
                            &[&text, &CUSTOM_SOURCE, user_id],
                        )
                        .await?;
                    let joke_id: Uuid = row.get(0);
                    tx.execute(
                        "INSERT INTO joke_topics (joke_id, topic_id) VALUES ($1, $2)",
                        &[&joke_id, topic_id],
                    )
                    .await?;
                    joke_count += 1;
                }
            }
        }

        tx.commit().await?;

        info!(
            "Seeded {} users, {} topics and {} jokes",
            users.len(),
            topics.len(),
            joke_count
        );
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Joke>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("{} WHERE j.id = $1 {}", JOKE_SELECT, JOKE_GROUP_BY);

        let row = client.query_opt(&query, &[&id]).await?;
        Ok(row.as_ref().map(joke_from_row))
    }
}

#[async_trait]
impl JokeStore for Database {
    async fn count(&self) -> Result<u64, ApiError> {
        let client = self.get_connection().await?;
        let row = client.query_one("SELECT COUNT(*) FROM jokes", &[]).await?;
        let count: i64 = row.get(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn sample_one(&self, offset: u64) -> Result<Option<Joke>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "{} {} ORDER BY j.number LIMIT 1 OFFSET $1",
            JOKE_SELECT, JOKE_GROUP_BY
        );
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let row = client.query_opt(&query, &[&offset]).await?;
        Ok(row.as_ref().map(joke_from_row))
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, ApiError> {
        let client = self.get_connection().await?;
        let row = client
            .query_opt(
                "SELECT id, name, created_at, updated_at FROM users WHERE name = $1",
                &[&name],
            )
            .await?;

        Ok(row.map(|row| User {
            id: row.get(0),
            name: row.get(1),
            created_at: row.get(2),
            updated_at: row.get(3),
        }))
    }

    async fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>, ApiError> {
        let client = self.get_connection().await?;
        let row = client
            .query_opt(
                "SELECT id, name, created_at, updated_at FROM topics WHERE name = $1",
                &[&name],
            )
            .await?;

        Ok(row.map(|row| Topic {
            id: row.get(0),
            name: row.get(1),
            created_at: row.get(2),
            updated_at: row.get(3),
        }))
    }

    /// ジョーク本体とトピックの紐付けを 1 トランザクションで書き込む。
    async fn insert(&self, joke: NewJoke) -> Result<Joke, ApiError> {
        let id = {
            let mut client = self.get_connection().await?;
            let tx = client.transaction().await?;

            let row = tx
                .query_one(
                    "INSERT INTO jokes (text, source, user_id) VALUES ($1, $2, $3) RETURNING id",
                    &[&joke.text, &joke.source, &joke.user_id],
                )
                .await?;
            let id: Uuid = row.get(0);

            tx.execute(
                "INSERT INTO joke_topics (joke_id, topic_id) VALUES ($1, $2)",
                &[&id, &joke.topic_id],
            )
            .await?;

            tx.commit().await?;
            id
        };

        let created = self.find_by_id(id).await?.ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("Joke {} vanished right after insert", id))
        })?;

        info!("Created joke number {} with id: {}", created.number, created.id);
        Ok(created)
    }

    async fn find_by_number(&self, number: i32) -> Result<Option<Joke>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("{} WHERE j.number = $1 {}", JOKE_SELECT, JOKE_GROUP_BY);

        let row = client.query_opt(&query, &[&number]).await?;
        Ok(row.as_ref().map(joke_from_row))
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let client = self.get_connection().await?;
        let rows_affected = client.execute("DELETE FROM jokes WHERE id = $1", &[&id]).await?;

        if rows_affected == 0 {
            debug!("Joke {} was already gone at delete time", id);
        } else {
            info!("Deleted joke with id: {}", id);
        }
        Ok(())
    }

    async fn query(
        &self,
        user_name: Option<&str>,
        topic_name: Option<&str>,
    ) -> Result<Vec<Joke>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            r#"{}
            WHERE ($1::TEXT IS NULL OR u.name = $1::TEXT)
              AND ($2::TEXT IS NULL OR EXISTS (
                    SELECT 1 FROM joke_topics fjt
                    JOIN topics ft ON ft.id = fjt.topic_id
                    WHERE fjt.joke_id = j.id AND ft.name = $2::TEXT
              ))
            {} ORDER BY j.number"#,
            JOKE_SELECT, JOKE_GROUP_BY
        );

        let rows = client.query(&query, &[&user_name, &topic_name]).await?;
        Ok(rows.iter().map(joke_from_row).collect())
    }

    /// `SELECT 1` を投げて DB が生きているか確認する。
    async fn health_check(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database health check failed: {}", e);
            ApiError::Database(format!("Health check failed: {}", e))
        })?;

        Ok(())
    }
}

fn joke_from_row(row: &Row) -> Joke {
    let user_id: Option<Uuid> = row.get(6);
    let user_name: Option<String> = row.get(7);

    Joke {
        id: row.get(0),
        number: row.get(1),
        text: row.get(2),
        source: row.get(3),
        created_at: row.get(4),
        updated_at: row.get(5),
        user: user_id.zip(user_name).map(|(id, name)| UserSummary { id, name }),
        topics: row.get(8),
    }
}
