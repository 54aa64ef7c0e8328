//! Prompt templates for the labeling conversation.

/// Fixed safety margin, in tokens, reserved for the closing of the prompt
/// when computing a run's digest budget.
pub const PROMPT_MARGIN: usize = 10;

/// System message for a labeling run.
///
/// `context` is the caller's free-form hint about what makes clusters in this
/// dataset distinct from each other; it lands verbatim between the two fixed
/// instruction blocks.
pub fn system_prompt(context: &str) -> String {
    format!(
        "Your job is to summarize lists of items with a short label of no more than 4 words. \
         The items are part of a cluster and the label will be used to distinguish this cluster \
         from others, so pay attention to what makes this group of similar items distinct.\n\
         {context}\n\
         The user will submit a numbered list of items and you should choose a label that best \
         summarizes the theme of the list so that someone browsing the labels will have a good \
         idea of what is in the list.\n\
         Do not use punctuation, do not explain yourself, respond with only a few words that \
         summarize the list."
    )
}

/// User message: fixed instruction plus the cluster's digest.
pub fn user_prompt(digest: &str) -> String {
    format!(
        "Here is a list of items, please summarize the list into a label using only a few words:\n{digest}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_embedded() {
        let prompt = system_prompt("customer support tickets for a bank");
        assert!(prompt.contains("customer support tickets for a bank"));
        assert!(prompt.contains("no more than 4 words"));
    }

    #[test]
    fn user_prompt_carries_digest() {
        let prompt = user_prompt("1. a\n2. b");
        assert!(prompt.ends_with("1. a\n2. b"));
    }
}
