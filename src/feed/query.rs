//! Statement construction for the feed.
//!
//! Filter values and the delete id are embedded into SQL text verbatim by
//! [`embed_literal`]. Nothing is escaped: a value containing a quote changes
//! the statement. Swapping that one function (and moving the values into
//! `Statement::params`) is all a parameterised variant needs.

use crate::feed::model::{FeedFilter, NewPost};
use crate::store::Statement;

const SELECT_POSTS: &str = "SELECT id, header, body, tags FROM posts";

const INSERT_POST: &str = "INSERT INTO posts (header, body, tags) VALUES (?1, ?2, ?3)";

/// Untrusted literal embedding. Returns the value unchanged.
pub fn embed_literal(value: &str) -> &str {
    value
}

/// Build the read statement for a filter.
///
/// The tag condition is an unanchored, case-sensitive substring match on
/// the raw `tags` column; the header condition is exact equality.
pub fn build_list_query(filter: &FeedFilter) -> Statement {
    let mut conditions = Vec::with_capacity(2);
    if !filter.tag.is_empty() {
        conditions.push(format!("instr(tags, '{}') > 0", embed_literal(&filter.tag)));
    }
    if !filter.header.is_empty() {
        conditions.push(format!("header='{}'", embed_literal(&filter.header)));
    }

    if conditions.is_empty() {
        Statement::text(SELECT_POSTS)
    } else {
        Statement::text(format!("{SELECT_POSTS} WHERE {}", conditions.join(" AND ")))
    }
}

/// Build the delete statement. `id` is not checked to be numeric.
pub fn build_delete_query(id: &str) -> Statement {
    Statement::text(format!("DELETE FROM posts WHERE id={}", embed_literal(id)))
}

/// Build the insert statement; fields are bound, not embedded.
pub fn build_insert(post: &NewPost) -> Statement {
    Statement::with_params(
        INSERT_POST,
        vec![post.header.clone(), post.body.clone(), post.tags.clone()],
    )
}
