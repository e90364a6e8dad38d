//! Integration tests for `#[derive(Entity)]` and SQL synthesis.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use norm_core::reconcile::{self, LiveColumn};
use norm_core::{
    Column, CoreError, Dialect, Entity, Registry, SemanticType, SqlBuilder, SqlValue,
};
use norm_derive::Entity;

#[derive(Debug, Default, Clone, Entity)]
#[collection(name = "Posts")]
pub struct Post {
    #[column]
    #[primary_key]
    pub id: i32,
    #[column]
    pub title: String,
    #[column]
    pub description: String,
    #[column]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Entity)]
pub struct Author {
    #[column(name = "author_id")]
    #[primary_key(auto_increment = false)]
    pub id: i32,
    #[column(name = "display_name")]
    pub name: String,
    #[column]
    pub nickname: Option<String>,
    #[column(nullable)]
    pub score: f64,
    #[column]
    pub active: bool,
    #[reference(column = "post_id")]
    pub latest_post: Option<Box<Post>>,
    pub scratch: Vec<u8>,
}

#[derive(Debug, Default, Entity)]
#[collection(name = "Posts")]
pub struct PostTitleOnly {
    #[column]
    #[primary_key]
    pub id: i32,
    #[column]
    pub title: String,
}

fn new_year() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn sample_post() -> Post {
    Post {
        id: 0,
        title: "Test".into(),
        description: "d".into(),
        created_at: new_year(),
    }
}

#[test]
fn test_descriptor_from_attributes() {
    let d = Author::describe();
    assert_eq!(d.table_name(), "Author");
    assert_eq!(d.collection_name(), None);

    let names: Vec<_> = d.columns().iter().map(|c| c.name).collect();
    assert_eq!(
        names,
        ["author_id", "display_name", "nickname", "score", "active"]
    );

    let pk = d.primary_key().unwrap();
    assert_eq!(pk.field, "id");
    assert!(!pk.auto_increment);

    let nickname = d.column_by_field("nickname").unwrap();
    assert!(nickname.nullable);
    assert_eq!(nickname.semantic, SemanticType::Text);
    assert!(d.column_by_field("score").unwrap().nullable);
    assert!(!d.column_by_field("active").unwrap().nullable);

    assert_eq!(d.references().len(), 1);
    assert_eq!(d.references()[0].column, "post_id");
    assert!(d.column_by_field("latest_post").is_none());
    assert!(d.column_by_field("scratch").is_none());
}

#[test]
fn test_registry_returns_same_descriptor() {
    let registry = Registry::new();
    let a = registry.descriptor::<Post>();
    let b = registry.descriptor::<Post>();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.table_name::<Post>(), "Posts");
    assert_eq!(registry.table_name::<Post>(), registry.table_name::<Post>());
    assert_eq!(registry.primary_key::<Post>().map(|c| c.name), Some("id"));
}

#[test]
fn test_create_collection_text_per_dialect() {
    let d = Post::describe();
    let sqlite = SqlBuilder::new(Dialect::Sqlite).create_collection(&d).unwrap();
    let mysql = SqlBuilder::new(Dialect::MySql).create_collection(&d).unwrap();
    assert_eq!(
        sqlite.sql(),
        "CREATE TABLE IF NOT EXISTS Posts (id INTEGER PRIMARY KEY AUTOINCREMENT, \
         title TEXT, description TEXT, created_at TEXT);"
    );
    assert_eq!(
        sqlite.sql().contains("AUTOINCREMENT"),
        mysql.sql().contains("AUTO_INCREMENT")
    );

    let manual = Author::describe();
    let sqlite = SqlBuilder::new(Dialect::Sqlite).create_collection(&manual).unwrap();
    let mysql = SqlBuilder::new(Dialect::MySql).create_collection(&manual).unwrap();
    assert!(!sqlite.sql().contains("AUTOINCREMENT"));
    assert!(!mysql.sql().contains("AUTO_INCREMENT"));
    assert_eq!(
        mysql.sql(),
        "CREATE TABLE IF NOT EXISTS Author (author_id INT PRIMARY KEY, \
         display_name VARCHAR(255), nickname VARCHAR(255), score DOUBLE, active TINYINT(1));"
    );
}

#[test]
fn test_insert_text_per_dialect() {
    let d = Post::describe();
    let sqlite = SqlBuilder::new(Dialect::Sqlite)
        .insert(&d, &sample_post())
        .unwrap();
    assert_eq!(
        sqlite.sql(),
        "INSERT INTO Posts (title, description, created_at) \
         VALUES ('Test', 'd', '2024-01-01T00:00:00.0000000Z'); SELECT last_insert_rowid();"
    );

    let mysql = SqlBuilder::new(Dialect::MySql)
        .insert(&d, &sample_post())
        .unwrap();
    assert!(mysql.sql().ends_with(" SELECT LAST_INSERT_ID();"));
    assert!(mysql.sql().contains("'2024-01-01 00:00:00'"));
}

#[test]
fn test_insert_never_carries_primary_key() {
    let mut post = sample_post();
    post.id = 987_654;
    let sql = SqlBuilder::new(Dialect::Sqlite)
        .insert(&Post::describe(), &post)
        .unwrap();
    assert!(!sql.sql().contains("987654"));
    assert!(!sql.sql().contains("(id"));
}

#[test]
fn test_delete_text() {
    let mut post = sample_post();
    post.id = 1;
    let sql = SqlBuilder::new(Dialect::Sqlite)
        .delete(&Post::describe(), &post)
        .unwrap();
    assert_eq!(sql.sql(), "DELETE FROM Posts WHERE id = '1' RETURNING *;");
}

#[test]
fn test_select_from_column_handles() {
    let d = Post::describe();
    let builder = SqlBuilder::new(Dialect::Sqlite);

    let by_id = builder.select(&d, &Post::id().eq(1)).unwrap();
    assert_eq!(by_id.sql(), "SELECT * FROM Posts WHERE id = 1;");

    let both = builder
        .select(&d, &Post::id().eq(1).and(Post::title().eq("O'Neil")))
        .unwrap();
    assert_eq!(
        both.sql(),
        "SELECT * FROM Posts WHERE id = 1 AND title = 'O''Neil';"
    );

    let renamed = builder
        .select(&Author::describe(), &Author::name().eq("x"))
        .unwrap();
    assert_eq!(renamed.sql(), "SELECT * FROM Author WHERE display_name = 'x';");

    let flag = SqlBuilder::new(Dialect::MySql)
        .select(&Author::describe(), &Author::active().eq(false))
        .unwrap();
    assert_eq!(flag.sql(), "SELECT * FROM Author WHERE active = 0;");
}

#[test]
fn test_select_rejects_unsupported_nodes() {
    let d = Post::describe();
    let builder = SqlBuilder::new(Dialect::Sqlite);
    assert_eq!(
        builder.select(&d, &Post::id().eq(1).or(Post::id().eq(2))),
        Err(CoreError::UnsupportedPredicate("OrElse".into()))
    );
    assert_eq!(
        builder.select(&d, &Post::id().ne(1)),
        Err(CoreError::UnsupportedPredicate("NotEqual".into()))
    );
    assert_eq!(
        builder.select(&Author::describe(), &Author::nickname().is_null()),
        Err(CoreError::UnsupportedPredicate("IsNull".into()))
    );
}

#[test]
fn test_reconcile_adds_description() {
    let builder = SqlBuilder::new(Dialect::Sqlite);
    let created = builder
        .create_collection(&PostTitleOnly::describe())
        .unwrap();
    assert_eq!(
        created.sql(),
        "CREATE TABLE IF NOT EXISTS Posts (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT);"
    );

    let live = [LiveColumn::new("id", "INTEGER"), LiveColumn::new("title", "TEXT")];
    let plan = reconcile::plan(&builder, &Post::describe(), &live).unwrap();
    let sqls: Vec<_> = plan.iter().map(|p| p.sql().to_string()).collect();
    assert_eq!(
        sqls,
        [
            "ALTER TABLE Posts ADD COLUMN description TEXT;",
            "ALTER TABLE Posts ADD COLUMN created_at TEXT;",
        ]
    );

    let after = [
        LiveColumn::new("id", "INTEGER"),
        LiveColumn::new("title", "TEXT"),
        LiveColumn::new("description", "TEXT"),
        LiveColumn::new("created_at", "TEXT"),
    ];
    assert!(reconcile::plan(&builder, &Post::describe(), &after)
        .unwrap()
        .is_empty());
}

#[test]
fn test_equality_and_hash() {
    let a = Post {
        id: 3,
        created_at: Utc.timestamp_opt(1_704_067_200, 400_000_000).unwrap(),
        ..sample_post()
    };
    let b = Post {
        id: 3,
        created_at: Utc.timestamp_opt(1_704_067_200, 0).unwrap(),
        ..sample_post()
    };
    let c = Post {
        id: 4,
        ..sample_post()
    };
    assert_eq!(a, b);
    assert_ne!(a, c);

    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(hash_of(&a), hash_of(&c));
}

fn hash_of(post: &Post) -> u64 {
    let mut hasher = DefaultHasher::new();
    post.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_assign_by_column_index() {
    let mut author = Author::default();
    author.assign(0, SqlValue::Int(12)).unwrap();
    author.assign(2, SqlValue::Text("nick".into())).unwrap();
    author.assign(4, SqlValue::Int(1)).unwrap();
    assert_eq!(author.id, 12);
    assert_eq!(author.nickname.as_deref(), Some("nick"));
    assert!(author.active);
    assert!(author.assign(1, SqlValue::Int(5)).is_err());
}

#[test]
fn test_column_handle_metadata() {
    assert_eq!(<PostColumns::CreatedAt as Column>::FIELD, "created_at");
    assert_eq!(<AuthorColumns::Name as Column>::FIELD, "name");
}
