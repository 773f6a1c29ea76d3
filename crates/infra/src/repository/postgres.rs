//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError | Scenario |
//! |-----------------------|------------|----------|
//! | `23505` | `Duplicate` | Email, name, like, save or bookmark already present |
//! | `23503` | `MissingReference` | Row references a deleted tip, user, location, ... |
//! | Any other / no code | `Backend` | Connection failures, syntax errors, ... |
//!
//! Row decoding failures (unknown notification kind, negative answer index)
//! surface as `Corrupt`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use lifetip_auth::User;
use lifetip_community::{
    Comment, HashtagCount, Notification, NotificationKind, Reaction, ReactionKind, Tip, TipQuery,
    TipStats,
};
use lifetip_core::{
    CommentId, LocationId, NotificationId, OrganizationId, Page, PolicyId, QuizId, TipId, UserId,
};
use lifetip_policies::{Bookmark, Location, Organization, Policy, PolicyQuery};
use lifetip_quizzes::Quiz;

use super::{
    CommentRepository, NotificationRepository, PolicyRepository, QuizRepository,
    ReactionRepository, Store, StoreError, StoreResult, TipRepository, UserRepository,
};

const SCHEMA: &str = include_str!("schema.sql");

/// Postgres store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", "-", e))?;
        Ok(Self::new(pool))
    }

    /// Create missing tables and indexes.
    #[instrument(skip(self), err)]
    pub async fn apply_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("apply_schema", "-", e))?;
        Ok(())
    }
}

fn reaction_table(kind: ReactionKind) -> &'static str {
    match kind {
        ReactionKind::Like => "tip_likes",
        ReactionKind::Save => "tip_saves",
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn page_bounds(page: Page) -> (i64, i64) {
    (i64::from(page.limit), i64::from(page.offset))
}

#[async_trait]
impl UserRepository for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, nickname, location_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .bind(user.location_id.map(Uuid::from))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", "users", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, nickname, location_id, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", "users", e))?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, email), err)]
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, nickname, location_id, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", "users", e))?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn find_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, nickname, location_id, created_at, updated_at FROM users WHERE id = ANY($1)",
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_users", "users", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET nickname = $2, location_id = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(user.id.as_uuid())
        .bind(&user.nickname)
        .bind(user.location_id.map(Uuid::from))
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", "users.location_id", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", "users", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TipRepository for PostgresStore {
    #[instrument(skip(self, tip), fields(tip_id = %tip.id), err)]
    async fn insert_tip(&self, tip: &Tip) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tips (id, author_id, title, content, hashtags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(tip.id.as_uuid())
        .bind(tip.author_id.as_uuid())
        .bind(&tip.title)
        .bind(&tip.content)
        .bind(&tip.hashtags)
        .bind(tip.created_at)
        .bind(tip.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_tip", "tips.author_id", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_tip(&self, id: TipId) -> StoreResult<Option<Tip>> {
        let row = sqlx::query_as::<_, TipRow>(
            "SELECT id, author_id, title, content, hashtags, created_at, updated_at FROM tips WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_tip", "tips", e))?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn list_tips(&self, query: &TipQuery) -> StoreResult<Vec<Tip>> {
        let (limit, offset) = page_bounds(query.page);
        let rows = sqlx::query_as::<_, TipRow>(
            r#"
            SELECT id, author_id, title, content, hashtags, created_at, updated_at
            FROM tips
            WHERE ($1::text IS NULL OR $1 = ANY(hashtags))
              AND ($2::text IS NULL OR title ILIKE $2 OR content ILIKE $2)
              AND ($3::uuid IS NULL OR author_id = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(query.hashtag.as_deref())
        .bind(query.search.as_deref().map(like_pattern))
        .bind(query.author_id.map(Uuid::from))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tips", "tips", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, tip), fields(tip_id = %tip.id), err)]
    async fn update_tip(&self, tip: &Tip) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE tips SET title = $2, content = $3, hashtags = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(tip.id.as_uuid())
        .bind(&tip.title)
        .bind(&tip.content)
        .bind(&tip.hashtags)
        .bind(tip.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_tip", "tips", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete_tip(&self, id: TipId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tips WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_tip", "tips", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn tip_stats(&self, id: TipId) -> StoreResult<TipStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tip_likes WHERE tip_id = $1) AS likes,
                (SELECT COUNT(*) FROM tip_saves WHERE tip_id = $1) AS saves,
                (SELECT COUNT(*) FROM comments  WHERE tip_id = $1) AS comments
            "#,
        )
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("tip_stats", "tips", e))?;

        Ok(TipStats {
            likes: count_column(&row, "likes")?,
            saves: count_column(&row, "saves")?,
            comments: count_column(&row, "comments")?,
        })
    }

    #[instrument(skip(self), err)]
    async fn popular_hashtags(&self, limit: u32) -> StoreResult<Vec<HashtagCount>> {
        let rows = sqlx::query(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM tips, UNNEST(hashtags) AS tag
            GROUP BY tag
            ORDER BY count DESC, tag ASC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("popular_hashtags", "tips", e))?;

        rows.iter()
            .map(|row| {
                Ok(HashtagCount {
                    tag: row
                        .try_get("tag")
                        .map_err(|e| corrupt("tips", format!("failed to read tag: {e}")))?,
                    count: count_column(row, "count")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CommentRepository for PostgresStore {
    #[instrument(skip(self, comment), fields(comment_id = %comment.id), err)]
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, tip_id, author_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(comment.id.as_uuid())
        .bind(comment.tip_id.as_uuid())
        .bind(comment.author_id.as_uuid())
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_comment", "comments.tip_id", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, tip_id, author_id, content, created_at, updated_at FROM comments WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_comment", "comments", e))?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn list_comments(&self, tip_id: TipId, page: Page) -> StoreResult<Vec<Comment>> {
        let (limit, offset) = page_bounds(page);
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, tip_id, author_id, content, created_at, updated_at
            FROM comments
            WHERE tip_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tip_id.as_uuid())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_comments", "comments", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete_comment(&self, id: CommentId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_comment", "comments", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReactionRepository for PostgresStore {
    #[instrument(skip(self), err)]
    async fn reaction_exists(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        tip_id: TipId,
    ) -> StoreResult<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND tip_id = $2) AS found",
            reaction_table(kind)
        );
        let row = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .bind(tip_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("reaction_exists", reaction_table(kind), e))?;
        row.try_get("found")
            .map_err(|e| corrupt(reaction_table(kind), format!("failed to read exists: {e}")))
    }

    #[instrument(skip(self, reaction), fields(kind = reaction.kind.as_str()), err)]
    async fn insert_reaction(&self, reaction: &Reaction) -> StoreResult<()> {
        let table = reaction_table(reaction.kind);
        let sql = format!("INSERT INTO {table} (user_id, tip_id, created_at) VALUES ($1, $2, $3)");
        sqlx::query(&sql)
            .bind(reaction.user_id.as_uuid())
            .bind(reaction.tip_id.as_uuid())
            .bind(reaction.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_reaction", table, e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_reaction(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        tip_id: TipId,
    ) -> StoreResult<bool> {
        let table = reaction_table(kind);
        let sql = format!("DELETE FROM {table} WHERE user_id = $1 AND tip_id = $2");
        let result = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .bind(tip_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_reaction", table, e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn count_reactions(&self, kind: ReactionKind, tip_id: TipId) -> StoreResult<u64> {
        let table = reaction_table(kind);
        let sql = format!("SELECT COUNT(*) AS total FROM {table} WHERE tip_id = $1");
        let row = sqlx::query(&sql)
            .bind(tip_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_reactions", table, e))?;
        count_column(&row, "total")
    }

    #[instrument(skip(self), err)]
    async fn reacted_tips(
        &self,
        kind: ReactionKind,
        user_id: UserId,
        page: Page,
    ) -> StoreResult<Vec<Tip>> {
        let table = reaction_table(kind);
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            r#"
            SELECT t.id, t.author_id, t.title, t.content, t.hashtags, t.created_at, t.updated_at
            FROM {table} r
            JOIN tips t ON t.id = r.tip_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC, r.tip_id DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, TipRow>(&sql)
            .bind(user_id.as_uuid())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("reacted_tips", table, e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PolicyRepository for PostgresStore {
    #[instrument(skip(self, organization), fields(organization_id = %organization.id), err)]
    async fn insert_organization(&self, organization: &Organization) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO organizations (id, name, description, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(organization.id.as_uuid())
        .bind(&organization.name)
        .bind(organization.description.as_deref())
        .bind(organization.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_organization", "organizations", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_organization(&self, id: OrganizationId) -> StoreResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, description, created_at FROM organizations WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_organization", "organizations", e))?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn list_organizations(&self) -> StoreResult<Vec<Organization>> {
        let rows = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, description, created_at FROM organizations ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_organizations", "organizations", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, location), fields(location_id = %location.id), err)]
    async fn insert_location(&self, location: &Location) -> StoreResult<()> {
        sqlx::query("INSERT INTO locations (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(location.id.as_uuid())
            .bind(&location.name)
            .bind(location.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_location", "locations", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_location(&self, id: LocationId) -> StoreResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(
            "SELECT id, name, created_at FROM locations WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_location", "locations", e))?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationRow>(
            "SELECT id, name, created_at FROM locations ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_locations", "locations", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, policy), fields(policy_id = %policy.id), err)]
    async fn insert_policy(&self, policy: &Policy) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO policies
                (id, organization_id, location_id, title, content, apply_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(policy.id.as_uuid())
        .bind(policy.organization_id.as_uuid())
        .bind(policy.location_id.as_uuid())
        .bind(&policy.title)
        .bind(&policy.content)
        .bind(policy.apply_url.as_deref())
        .bind(policy.created_at)
        .bind(policy.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_policy", "policies", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_policy(&self, id: PolicyId) -> StoreResult<Option<Policy>> {
        let row = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT id, organization_id, location_id, title, content, apply_url, created_at, updated_at
            FROM policies WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_policy", "policies", e))?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn list_policies(&self, query: &PolicyQuery) -> StoreResult<Vec<Policy>> {
        let (limit, offset) = page_bounds(query.page);
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT id, organization_id, location_id, title, content, apply_url, created_at, updated_at
            FROM policies
            WHERE ($1::uuid IS NULL OR location_id = $1)
              AND ($2::uuid IS NULL OR organization_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.location_id.map(Uuid::from))
        .bind(query.organization_id.map(Uuid::from))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_policies", "policies", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), err)]
    async fn bookmark_exists(&self, user_id: UserId, policy_id: PolicyId) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM policy_bookmarks WHERE user_id = $1 AND policy_id = $2) AS found",
        )
        .bind(user_id.as_uuid())
        .bind(policy_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("bookmark_exists", "policy_bookmarks", e))?;
        row.try_get("found")
            .map_err(|e| corrupt("policy_bookmarks", format!("failed to read exists: {e}")))
    }

    #[instrument(skip(self, bookmark), err)]
    async fn insert_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO policy_bookmarks (user_id, policy_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(bookmark.user_id.as_uuid())
        .bind(bookmark.policy_id.as_uuid())
        .bind(bookmark.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_bookmark", "policy_bookmarks", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_bookmark(&self, user_id: UserId, policy_id: PolicyId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM policy_bookmarks WHERE user_id = $1 AND policy_id = $2")
            .bind(user_id.as_uuid())
            .bind(policy_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_bookmark", "policy_bookmarks", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn bookmarked_policies(&self, user_id: UserId, page: Page) -> StoreResult<Vec<Policy>> {
        let (limit, offset) = page_bounds(page);
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT p.id, p.organization_id, p.location_id, p.title, p.content, p.apply_url,
                   p.created_at, p.updated_at
            FROM policy_bookmarks b
            JOIN policies p ON p.id = b.policy_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC, b.policy_id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("bookmarked_policies", "policy_bookmarks", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl QuizRepository for PostgresStore {
    #[instrument(skip(self, quiz), fields(quiz_id = %quiz.id), err)]
    async fn insert_quiz(&self, quiz: &Quiz) -> StoreResult<()> {
        let answer_index = i32::try_from(quiz.answer_index)
            .map_err(|_| corrupt("quizzes", "answer index out of range"))?;
        sqlx::query(
            r#"
            INSERT INTO quizzes (id, question, choices, answer_index, explanation, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(quiz.id.as_uuid())
        .bind(&quiz.question)
        .bind(&quiz.choices)
        .bind(answer_index)
        .bind(quiz.explanation.as_deref())
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_quiz", "quizzes", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_quiz(&self, id: QuizId) -> StoreResult<Option<Quiz>> {
        let row = sqlx::query_as::<_, QuizRow>(
            "SELECT id, question, choices, answer_index, explanation, created_at FROM quizzes WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_quiz", "quizzes", e))?;
        row.map(Quiz::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_quizzes(&self, page: Page) -> StoreResult<Vec<Quiz>> {
        let (limit, offset) = page_bounds(page);
        let rows = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, question, choices, answer_index, explanation, created_at
            FROM quizzes
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_quizzes", "quizzes", e))?;
        rows.into_iter().map(Quiz::try_from).collect()
    }
}

#[async_trait]
impl NotificationRepository for PostgresStore {
    #[instrument(skip(self, notification), fields(notification_id = %notification.id), err)]
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, actor_id, kind, tip_id, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.recipient_id.as_uuid())
        .bind(notification.actor_id.as_uuid())
        .bind(notification.kind.as_str())
        .bind(notification.tip_id.as_uuid())
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_notification", "notifications", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_notifications(
        &self,
        recipient_id: UserId,
        page: Page,
    ) -> StoreResult<Vec<Notification>> {
        let (limit, offset) = page_bounds(page);
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_id, actor_id, kind, tip_id, read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(recipient_id.as_uuid())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_notifications", "notifications", e))?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    #[instrument(skip(self), err)]
    async fn mark_notification_read(
        &self,
        recipient_id: UserId,
        id: NotificationId,
    ) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient_id = $2")
                .bind(id.as_uuid())
                .bind(recipient_id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("mark_notification_read", "notifications", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn corrupt(table: &'static str, reason: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        table,
        reason: reason.into(),
    }
}

fn count_column(row: &PgRow, column: &str) -> StoreResult<u64> {
    let n: i64 = row
        .try_get(column)
        .map_err(|e| corrupt("-", format!("failed to read {column}: {e}")))?;
    u64::try_from(n).map_err(|_| corrupt("-", format!("negative {column}")))
}

/// Map SQLx errors to [`StoreError`] (see the table in the module docs).
fn map_sqlx_error(operation: &'static str, table: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StoreError::Duplicate(table),
            Some("23503") => StoreError::MissingReference(table),
            _ => StoreError::Backend {
                operation,
                message: db_err.message().to_string(),
            },
        },
        sqlx::Error::PoolClosed => StoreError::Backend {
            operation,
            message: "connection pool closed".to_string(),
        },
        other => StoreError::Backend {
            operation,
            message: other.to_string(),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    nickname: String,
    location_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            nickname: row.try_get("nickname")?,
            location_id: row.try_get("location_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            password_hash: row.password_hash,
            nickname: row.nickname,
            location_id: row.location_id.map(LocationId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

struct TipRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    content: String,
    hashtags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TipRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TipRow {
            id: row.try_get("id")?,
            author_id: row.try_get("author_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            hashtags: row.try_get("hashtags")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<TipRow> for Tip {
    fn from(row: TipRow) -> Self {
        Tip {
            id: TipId::from_uuid(row.id),
            author_id: UserId::from_uuid(row.author_id),
            title: row.title,
            content: row.content,
            hashtags: row.hashtags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

struct CommentRow {
    id: Uuid,
    tip_id: Uuid,
    author_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for CommentRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CommentRow {
            id: row.try_get("id")?,
            tip_id: row.try_get("tip_id")?,
            author_id: row.try_get("author_id")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId::from_uuid(row.id),
            tip_id: TipId::from_uuid(row.tip_id),
            author_id: UserId::from_uuid(row.author_id),
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

struct OrganizationRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for OrganizationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrganizationRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: OrganizationId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

struct LocationRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for LocationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LocationRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: LocationId::from_uuid(row.id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

struct PolicyRow {
    id: Uuid,
    organization_id: Uuid,
    location_id: Uuid,
    title: String,
    content: String,
    apply_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for PolicyRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PolicyRow {
            id: row.try_get("id")?,
            organization_id: row.try_get("organization_id")?,
            location_id: row.try_get("location_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            apply_url: row.try_get("apply_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<PolicyRow> for Policy {
    fn from(row: PolicyRow) -> Self {
        Policy {
            id: PolicyId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            location_id: LocationId::from_uuid(row.location_id),
            title: row.title,
            content: row.content,
            apply_url: row.apply_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

struct QuizRow {
    id: Uuid,
    question: String,
    choices: Vec<String>,
    answer_index: i32,
    explanation: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for QuizRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(QuizRow {
            id: row.try_get("id")?,
            question: row.try_get("question")?,
            choices: row.try_get("choices")?,
            answer_index: row.try_get("answer_index")?,
            explanation: row.try_get("explanation")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<QuizRow> for Quiz {
    type Error = StoreError;

    fn try_from(row: QuizRow) -> Result<Self, Self::Error> {
        let answer_index = u32::try_from(row.answer_index)
            .ok()
            .filter(|i| (*i as usize) < row.choices.len())
            .ok_or_else(|| corrupt("quizzes", format!("answer index {} out of range", row.answer_index)))?;
        Ok(Quiz {
            id: QuizId::from_uuid(row.id),
            question: row.question,
            choices: row.choices,
            answer_index,
            explanation: row.explanation,
            created_at: row.created_at,
        })
    }
}

struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    actor_id: Uuid,
    kind: String,
    tip_id: Uuid,
    read: bool,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for NotificationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(NotificationRow {
            id: row.try_get("id")?,
            recipient_id: row.try_get("recipient_id")?,
            actor_id: row.try_get("actor_id")?,
            kind: row.try_get("kind")?,
            tip_id: row.try_get("tip_id")?,
            read: row.try_get("read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let kind: NotificationKind = row
            .kind
            .parse()
            .map_err(|e| corrupt("notifications", format!("{e}")))?;
        Ok(Notification {
            id: NotificationId::from_uuid(row.id),
            recipient_id: UserId::from_uuid(row.recipient_id),
            actor_id: UserId::from_uuid(row.actor_id),
            kind,
            tip_id: TipId::from_uuid(row.tip_id),
            read: row.read,
            created_at: row.created_at,
        })
    }
}
