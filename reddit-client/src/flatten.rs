use chrono::{DateTime, Utc};
use serde_json::Value;
use threadlens_core::Comment;

/// Flattens Reddit's nested comment listing into depth-first pre-order.
///
/// Each emitted record's `depth` is its nesting level (top-level replies are
/// 0). Only `kind == "t1"` nodes are emitted; "more" stubs and any other
/// node kinds are skipped silently. Walks with an explicit stack so
/// arbitrarily deep reply chains cannot overflow the call stack. Pure
/// function of the input tree.
pub fn flatten_comment_tree(listing: &Value) -> Vec<Comment> {
    let mut comments = Vec::new();
    let mut stack: Vec<(&Value, u32)> = Vec::new();
    push_children(listing, 0, &mut stack);

    while let Some((node, depth)) = stack.pop() {
        if node.get("kind").and_then(Value::as_str) != Some("t1") {
            continue;
        }
        let Some(data) = node.get("data") else {
            continue;
        };

        comments.push(Comment {
            id: str_field(data, "id"),
            author: data
                .get("author")
                .and_then(Value::as_str)
                .unwrap_or("[deleted]")
                .to_string(),
            body_text: str_field(data, "body"),
            score: data.get("score").and_then(Value::as_i64).unwrap_or(0),
            created_at: timestamp_field(data),
            depth,
        });

        // `replies` is an empty string when a comment has no children;
        // push_children only descends into the listing shape.
        if let Some(replies) = data.get("replies") {
            push_children(replies, depth + 1, &mut stack);
        }
    }

    comments
}

/// Pushes a listing's children in reverse so the stack pops them in
/// original order, preserving pre-order.
fn push_children<'a>(listing: &'a Value, depth: u32, stack: &mut Vec<(&'a Value, u32)>) {
    if let Some(children) = listing
        .get("data")
        .and_then(|data| data.get("children"))
        .and_then(Value::as_array)
    {
        for child in children.iter().rev() {
            stack.push((child, depth));
        }
    }
}

fn str_field(data: &Value, field: &str) -> String {
    data.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn timestamp_field(data: &Value) -> DateTime<Utc> {
    data.get("created_utc")
        .and_then(Value::as_f64)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0))
        .unwrap_or_default()
}
