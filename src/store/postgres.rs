use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
	CommentStore, Database, NewComment, NewPost, NewUser, PostChanges, PostStore, StoreError,
	UserStore,
};
use crate::model::{Author, Comment, Post, User};

const POST_COLUMNS: &str = r#"
	p.id, p.title, p.body, p.image, p.hashtags, p.created_at, p.updated_at,
	u.id AS author_id, u.firstname AS author_firstname, u.lastname AS author_lastname
"#;

const COMMENT_COLUMNS: &str = r#"
	c.id, c.content, c.post_id, c.created_at, c.updated_at,
	u.id AS author_id, u.firstname AS author_firstname, u.lastname AS author_lastname
"#;

/// A [`super::Store`] backed by a Postgres pool.
pub struct PgStore {
	database: Database,
}

impl PgStore {
	pub fn new(database: Database) -> Self {
		Self { database }
	}
}

#[derive(sqlx::FromRow)]
struct PostRow {
	id: Uuid,
	title: String,
	body: String,
	image: Option<String>,
	hashtags: Vec<String>,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
	author_id: Uuid,
	author_firstname: String,
	author_lastname: String,
}

impl From<PostRow> for Post {
	fn from(row: PostRow) -> Self {
		Self {
			id: row.id,
			title: row.title,
			body: row.body,
			image: row.image,
			hashtags: row.hashtags,
			author: Author {
				id: row.author_id,
				firstname: row.author_firstname,
				lastname: row.author_lastname,
			},
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

#[derive(sqlx::FromRow)]
struct CommentRow {
	id: Uuid,
	content: String,
	post_id: Uuid,
	post_title: Option<String>,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
	author_id: Uuid,
	author_firstname: String,
	author_lastname: String,
}

impl From<CommentRow> for Comment {
	fn from(row: CommentRow) -> Self {
		Self {
			id: row.id,
			content: row.content,
			post_id: row.post_id,
			post_title: row.post_title,
			author: Author {
				id: row.author_id,
				firstname: row.author_firstname,
				lastname: row.author_lastname,
			},
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

/// Selects posts joined with their author, followed by `rest`.
fn select_posts(rest: &str) -> String {
	format!(r#"SELECT {POST_COLUMNS} FROM post p JOIN "user" u ON u.id = p.author_id {rest}"#)
}

/// Wraps a statement returning post rows as `p`, joining the author.
fn with_posts(statement: &str) -> String {
	format!(
		r#"WITH p AS ({statement} RETURNING *) SELECT {POST_COLUMNS} FROM p JOIN "user" u ON u.id = p.author_id"#
	)
}

fn select_comments(rest: &str) -> String {
	format!(
		r#"SELECT {COMMENT_COLUMNS}, NULL::TEXT AS post_title FROM comment c JOIN "user" u ON u.id = c.author_id {rest}"#
	)
}

fn with_comments(statement: &str) -> String {
	format!(
		r#"WITH c AS ({statement} RETURNING *) SELECT {COMMENT_COLUMNS}, NULL::TEXT AS post_title FROM c JOIN "user" u ON u.id = c.author_id"#
	)
}

#[async_trait]
impl UserStore for PgStore {
	async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, firstname, lastname, email, password)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(user.firstname)
		.bind(user.lastname)
		.bind(user.email)
		.bind(user.password)
		.fetch_one(&self.database)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref d) if d.constraint() == Some("user_email_key") => {
				StoreError::EmailTaken
			}
			e => StoreError::Database(e),
		})
	}

	async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = $1"#)
				.bind(id)
				.fetch_optional(&self.database)
				.await?,
		)
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
				.bind(email)
				.fetch_optional(&self.database)
				.await?,
		)
	}

	async fn set_reset_code(&self, id: Uuid, code: &str) -> Result<(), StoreError> {
		sqlx::query(
			r#"
				UPDATE "user"
				SET reset_code = $2, reset_code_issued_at = now(), updated_at = now()
				WHERE id = $1
			"#,
		)
		.bind(id)
		.bind(code)
		.execute(&self.database)
		.await?;

		Ok(())
	}

	async fn reset_password(
		&self,
		id: Uuid,
		code: &str,
		password: &[u8],
	) -> Result<bool, StoreError> {
		let result = sqlx::query(
			r#"
				UPDATE "user"
				SET password = $3, reset_code = NULL, reset_code_issued_at = NULL, updated_at = now()
				WHERE id = $1 AND reset_code = $2
			"#,
		)
		.bind(id)
		.bind(code)
		.bind(password)
		.execute(&self.database)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}

#[async_trait]
impl PostStore for PgStore {
	async fn insert(&self, post: NewPost) -> Result<Post, StoreError> {
		let sql = with_posts(
			"INSERT INTO post (author_id, title, body, image, hashtags) VALUES ($1, $2, $3, $4, $5)",
		);

		let row = sqlx::query_as::<_, PostRow>(&sql)
			.bind(post.author_id)
			.bind(post.title)
			.bind(post.body)
			.bind(post.image)
			.bind(post.hashtags)
			.fetch_one(&self.database)
			.await?;

		Ok(row.into())
	}

	async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
		let sql = select_posts("WHERE p.id = $1");

		let row = sqlx::query_as::<_, PostRow>(&sql)
			.bind(id)
			.fetch_optional(&self.database)
			.await?;

		Ok(row.map(Post::from))
	}

	async fn list(&self) -> Result<Vec<Post>, StoreError> {
		let sql = select_posts("ORDER BY p.created_at DESC");

		let rows = sqlx::query_as::<_, PostRow>(&sql)
			.fetch_all(&self.database)
			.await?;

		Ok(rows.into_iter().map(Post::from).collect())
	}

	async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError> {
		let sql = select_posts("WHERE p.author_id = $1 ORDER BY p.created_at DESC");

		let rows = sqlx::query_as::<_, PostRow>(&sql)
			.bind(author_id)
			.fetch_all(&self.database)
			.await?;

		Ok(rows.into_iter().map(Post::from).collect())
	}

	async fn search(&self, hashtags: &[String]) -> Result<Vec<Post>, StoreError> {
		let sql = select_posts("WHERE p.hashtags && $1 ORDER BY p.created_at DESC");

		let rows = sqlx::query_as::<_, PostRow>(&sql)
			.bind(hashtags)
			.fetch_all(&self.database)
			.await?;

		Ok(rows.into_iter().map(Post::from).collect())
	}

	async fn trending(&self, limit: usize) -> Result<Vec<Post>, StoreError> {
		let sql =
			select_posts("ORDER BY cardinality(p.hashtags) DESC, p.created_at DESC LIMIT $1");

		let rows = sqlx::query_as::<_, PostRow>(&sql)
			.bind(i64::try_from(limit).unwrap_or(i64::MAX))
			.fetch_all(&self.database)
			.await?;

		Ok(rows.into_iter().map(Post::from).collect())
	}

	async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
		let sql = with_posts(
			r"
				UPDATE post
				SET title = COALESCE($2, title),
					body = COALESCE($3, body),
					image = COALESCE($4, image),
					hashtags = COALESCE($5, hashtags),
					updated_at = now()
				WHERE id = $1
			",
		);

		let row = sqlx::query_as::<_, PostRow>(&sql)
			.bind(id)
			.bind(changes.title)
			.bind(changes.body)
			.bind(changes.image)
			.bind(changes.hashtags)
			.fetch_optional(&self.database)
			.await?;

		Ok(row.map(Post::from))
	}

	async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
		let result = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.database)
			.await?;

		Ok(result.rows_affected() > 0)
	}
}

#[async_trait]
impl CommentStore for PgStore {
	async fn insert(&self, comment: NewComment) -> Result<Comment, StoreError> {
		let sql =
			with_comments("INSERT INTO comment (author_id, post_id, content) VALUES ($1, $2, $3)");

		let row = sqlx::query_as::<_, CommentRow>(&sql)
			.bind(comment.author_id)
			.bind(comment.post_id)
			.bind(comment.content)
			.fetch_one(&self.database)
			.await?;

		Ok(row.into())
	}

	async fn find(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
		let sql = select_comments("WHERE c.id = $1");

		let row = sqlx::query_as::<_, CommentRow>(&sql)
			.bind(id)
			.fetch_optional(&self.database)
			.await?;

		Ok(row.map(Comment::from))
	}

	async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, StoreError> {
		let sql = select_comments("WHERE c.post_id = $1 ORDER BY c.created_at DESC");

		let rows = sqlx::query_as::<_, CommentRow>(&sql)
			.bind(post_id)
			.fetch_all(&self.database)
			.await?;

		Ok(rows.into_iter().map(Comment::from).collect())
	}

	async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Comment>, StoreError> {
		let sql = format!(
			r#"
				SELECT {COMMENT_COLUMNS}, p.title AS post_title
				FROM comment c
				JOIN "user" u ON u.id = c.author_id
				LEFT JOIN post p ON p.id = c.post_id
				WHERE c.author_id = $1
				ORDER BY c.created_at DESC
			"#
		);

		let rows = sqlx::query_as::<_, CommentRow>(&sql)
			.bind(author_id)
			.fetch_all(&self.database)
			.await?;

		Ok(rows.into_iter().map(Comment::from).collect())
	}

	async fn update(&self, id: Uuid, content: &str) -> Result<Option<Comment>, StoreError> {
		let sql =
			with_comments("UPDATE comment SET content = $2, updated_at = now() WHERE id = $1");

		let row = sqlx::query_as::<_, CommentRow>(&sql)
			.bind(id)
			.bind(content)
			.fetch_optional(&self.database)
			.await?;

		Ok(row.map(Comment::from))
	}

	async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
		let result = sqlx::query("DELETE FROM comment WHERE id = $1")
			.bind(id)
			.execute(&self.database)
			.await?;

		Ok(result.rows_affected() > 0)
	}
}
