//! Collection operations against a live MySQL server.
//!
//! Ignored by default. Run with a disposable database:
//!
//! ```text
//! NORM_MYSQL_HOST=127.0.0.1 NORM_MYSQL_USER=root NORM_MYSQL_PASSWORD=secret \
//! NORM_MYSQL_DATABASE=norm_test cargo test -p norm --test mysql_collection -- --ignored
//! ```

use std::env;

use chrono::{DateTime, TimeZone, Utc};
use norm::{Column, Connection, ConnectionBuilder, Dialect, Entity};

#[derive(Debug, Default, Clone, Entity)]
#[collection(name = "NormMySqlPosts")]
pub struct Post {
    #[column]
    #[primary_key]
    pub id: i32,
    #[column]
    pub title: String,
    #[column]
    pub published: bool,
    #[column]
    pub created_at: DateTime<Utc>,
}

fn connect() -> Connection {
    let var = |name: &str| env::var(name).unwrap_or_else(|_| panic!("{name} is not set"));
    let mut builder = ConnectionBuilder::new(Dialect::MySql)
        .hostname(var("NORM_MYSQL_HOST"))
        .unwrap()
        .username(var("NORM_MYSQL_USER"))
        .unwrap()
        .password(var("NORM_MYSQL_PASSWORD"))
        .unwrap()
        .database(var("NORM_MYSQL_DATABASE"))
        .unwrap();
    if let Ok(port) = env::var("NORM_MYSQL_PORT") {
        builder = builder.port(port.parse().unwrap()).unwrap();
    }
    builder.build_and_connect().unwrap()
}

#[test]
#[ignore = "needs a MySQL server (NORM_MYSQL_* variables)"]
fn test_mysql_round_trip() {
    let connection = connect();
    let posts = connection.collection::<Post>().unwrap();
    posts.truncate().unwrap();

    let inserted = posts
        .insert(Post {
            id: 0,
            title: "Hello".into(),
            published: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap(),
        })
        .unwrap();
    assert!(inserted.id > 0);

    let found = posts.find_one(Post::id().eq(inserted.id)).unwrap().unwrap();
    assert_eq!(found, inserted);

    assert!(posts.remove(&inserted).unwrap());
    assert!(posts.find_one(Post::id().eq(inserted.id)).unwrap().is_none());
    assert!(!posts.truncate().unwrap());

    assert!(connection.sync_schema::<Post>().unwrap().is_empty());
}
