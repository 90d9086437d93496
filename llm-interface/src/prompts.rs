use std::fmt::Write;
use threadlens_core::{Comment, SummaryLength, Thread};

/// Top-level comments per relevance request, to stay under model input
/// limits.
pub const RELEVANCE_BATCH_SIZE: usize = 5;
/// Comments embedded in the summary prompt.
pub const SUMMARY_TOP_COMMENTS: usize = 5;
/// Per-comment character cap in the summary prompt.
pub const SUMMARY_COMMENT_CHARS: usize = 200;
/// Hard cap on the theme-extraction input text, in characters.
pub const THEME_INPUT_CHARS: usize = 10_000;
pub const TRUNCATION_MARKER: &str = "\n[COMMENTS TRUNCATED]";

fn length_directive(length: SummaryLength) -> &'static str {
    match length {
        SummaryLength::Short => "brief",
        SummaryLength::Medium => "moderate",
        SummaryLength::Long => "comprehensive",
    }
}

/// Summary prompt: title, author, body, and up to five top-level comments
/// truncated to 200 characters each.
pub fn summary_prompt(thread: &Thread, length: SummaryLength) -> String {
    let mut prompt = format!(
        "Provide a {} summary of the following Reddit thread, capturing the \
         main points of the post and the discussion.\n\n\
         TITLE: {}\nAUTHOR: u/{}\nPOST:\n{}\n",
        length_directive(length),
        thread.title,
        thread.author,
        thread.body_text,
    );

    let top_comments: Vec<&Comment> = thread
        .comments
        .iter()
        .filter(|c| c.is_top_level())
        .take(SUMMARY_TOP_COMMENTS)
        .collect();

    if !top_comments.is_empty() {
        prompt.push_str("\nTOP COMMENTS:\n");
        for (i, comment) in top_comments.iter().enumerate() {
            let _ = writeln!(
                prompt,
                "{}. u/{} ({} points): {}",
                i + 1,
                comment.author,
                comment.score,
                truncate_chars(&comment.body_text, SUMMARY_COMMENT_CHARS),
            );
        }
    }

    prompt.push_str("\nSUMMARY:");
    prompt
}

/// Groups the top-level comments (`depth == 0`) into ordered batches of
/// `RELEVANCE_BATCH_SIZE`, preserving original order.
pub fn top_level_batches(thread: &Thread) -> Vec<Vec<&Comment>> {
    let top_level: Vec<&Comment> = thread.comments.iter().filter(|c| c.is_top_level()).collect();
    top_level
        .chunks(RELEVANCE_BATCH_SIZE)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// One relevance-analysis prompt per batch, each instructing a JSON array
/// with one object per input comment.
pub fn relevance_prompts(thread: &Thread) -> Vec<String> {
    top_level_batches(thread)
        .iter()
        .map(|batch| relevance_batch_prompt(thread, batch))
        .collect()
}

fn relevance_batch_prompt(thread: &Thread, batch: &[&Comment]) -> String {
    let mut prompt = format!(
        "You will be given a Reddit post and a batch of comments. Rate each \
         comment's relevance and usefulness to the original post.\n\n\
         ORIGINAL POST:\n{}\n{}\n\nCOMMENTS:\n",
        thread.title, thread.body_text,
    );

    for (i, comment) in batch.iter().enumerate() {
        let _ = writeln!(prompt, "{}. u/{}: {}", i + 1, comment.author, comment.body_text);
    }

    let _ = write!(
        prompt,
        "\nReturn a JSON array with exactly one object per comment, in the \
         same order, each with exactly these fields:\n\
         {{\"author\": string, \"relevance_score\": integer 1-10, \
         \"usefulness_score\": integer 1-10, \"key_points\": array of \
         strings, \"provides_actionable_advice\": boolean}}",
    );
    prompt
}

/// Theme-extraction prompt over the concatenation of all comment bodies,
/// hard-truncated at 10,000 characters.
pub fn theme_prompt(thread: &Thread) -> String {
    let combined = thread
        .comments
        .iter()
        .map(|c| c.body_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut text = truncate_chars(&combined, THEME_INPUT_CHARS);
    if text.len() != combined.len() {
        text.push_str(TRUNCATION_MARKER);
    }

    format!(
        "Analyze the following Reddit comments and identify the recurring \
         patterns of the discussion.\n\nCOMMENTS:\n{}\n\n\
         Return a JSON object with exactly these fields:\n\
         {{\"major_themes\": array of strings, \"consensus_viewpoints\": \
         array of strings, \"significant_disagreements\": array of strings, \
         \"response_patterns\": array of strings}}",
        text,
    )
}

/// Truncates to at most `max` characters, respecting UTF-8 boundaries.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(author: &str, body: &str, depth: u32) -> Comment {
        Comment {
            id: format!("{author}_{depth}"),
            author: author.to_string(),
            body_text: body.to_string(),
            score: 5,
            created_at: Utc::now(),
            depth,
        }
    }

    fn thread_with(comments: Vec<Comment>) -> Thread {
        Thread {
            title: "A question".to_string(),
            author: "op_user".to_string(),
            body_text: "What do you think?".to_string(),
            score: 12,
            url: "https://www.reddit.com/r/test/comments/abc123/a_question/".to_string(),
            created_at: Utc::now(),
            comments,
        }
    }

    #[test]
    fn test_summary_prompt_embeds_thread_and_directive() {
        let thread = thread_with(vec![comment("alice", "Great point", 0)]);

        let prompt = summary_prompt(&thread, SummaryLength::Short);
        assert!(prompt.contains("brief"));
        assert!(prompt.contains("TITLE: A question"));
        assert!(prompt.contains("AUTHOR: u/op_user"));
        assert!(prompt.contains("u/alice (5 points): Great point"));

        assert!(summary_prompt(&thread, SummaryLength::Medium).contains("moderate"));
        assert!(summary_prompt(&thread, SummaryLength::Long).contains("comprehensive"));
    }

    #[test]
    fn test_summary_prompt_truncates_long_comments_to_200_chars() {
        let long_body = "x".repeat(500);
        let thread = thread_with(vec![comment("alice", &long_body, 0)]);

        let prompt = summary_prompt(&thread, SummaryLength::Medium);
        assert!(prompt.contains(&"x".repeat(200)));
        assert!(!prompt.contains(&"x".repeat(201)));
    }

    #[test]
    fn test_summary_prompt_uses_at_most_five_top_comments() {
        let comments = (0..8).map(|i| comment(&format!("user{i}"), "body", 0)).collect();
        let prompt = summary_prompt(&thread_with(comments), SummaryLength::Medium);
        assert!(prompt.contains("u/user4"));
        assert!(!prompt.contains("u/user5"));
    }

    #[test]
    fn test_batches_cover_top_level_comments_exactly_once_in_order() {
        // 12 top-level comments interleaved with replies -> ceil(12/5) = 3 batches.
        let mut comments = Vec::new();
        for i in 0..12 {
            comments.push(comment(&format!("top{i}"), "top-level", 0));
            comments.push(comment(&format!("reply{i}"), "nested", 1));
        }
        let thread = thread_with(comments);

        let batches = top_level_batches(&thread);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 5);
        assert_eq!(batches[1].len(), 5);
        assert_eq!(batches[2].len(), 2);

        let flattened: Vec<&str> = batches
            .iter()
            .flatten()
            .map(|c| c.author.as_str())
            .collect();
        let expected: Vec<String> = (0..12).map(|i| format!("top{i}")).collect();
        assert_eq!(flattened, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_comments_yield_zero_batches() {
        let thread = thread_with(vec![]);
        assert!(top_level_batches(&thread).is_empty());
        assert!(relevance_prompts(&thread).is_empty());
    }

    #[test]
    fn test_single_comment_yields_one_batch_of_one() {
        let thread = thread_with(vec![comment("alice", "Great point", 0)]);
        let batches = top_level_batches(&thread);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0].author, "alice");

        let prompts = relevance_prompts(&thread);
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("u/alice: Great point"));
        assert!(prompts[0].contains("JSON array"));
    }

    #[test]
    fn test_relevance_prompts_skip_nested_comments() {
        let thread = thread_with(vec![
            comment("top", "top-level", 0),
            comment("nested", "a reply", 1),
        ]);
        let prompts = relevance_prompts(&thread);
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("u/top"));
        assert!(!prompts[0].contains("u/nested"));
    }

    #[test]
    fn test_theme_input_truncation_law() {
        // Over the limit: exactly 10,000 characters plus the marker.
        let body = "y".repeat(THEME_INPUT_CHARS + 500);
        let thread = thread_with(vec![comment("alice", &body, 0)]);
        let prompt = theme_prompt(&thread);
        assert!(prompt.contains(&format!("{}{}", "y".repeat(THEME_INPUT_CHARS), TRUNCATION_MARKER)));
        assert!(!prompt.contains(&"y".repeat(THEME_INPUT_CHARS + 1)));

        // At the limit: passed through unchanged, no marker.
        let body = "z".repeat(THEME_INPUT_CHARS);
        let thread = thread_with(vec![comment("alice", &body, 0)]);
        let prompt = theme_prompt(&thread);
        assert!(prompt.contains(&"z".repeat(THEME_INPUT_CHARS)));
        assert!(!prompt.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_theme_prompt_includes_nested_comment_bodies() {
        let thread = thread_with(vec![
            comment("top", "surface take", 0),
            comment("nested", "deeper take", 3),
        ]);
        let prompt = theme_prompt(&thread);
        assert!(prompt.contains("surface take"));
        assert!(prompt.contains("deeper take"));
    }
}
