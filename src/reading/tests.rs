use super::*;

#[test]
fn card_list_splits_on_commas() {
    let cards = parse_card_list("The Fool, The Magician, Ten of Cups");
    assert_eq!(cards, vec!["The Fool", "The Magician", "Ten of Cups"]);
}

#[test]
fn card_list_trims_whitespace() {
    let cards = parse_card_list("  The Fool ,\n The Tower  ");
    assert_eq!(cards, vec!["The Fool", "The Tower"]);
}

#[test]
fn card_list_drops_empty_tokens() {
    let cards = parse_card_list("The Fool,, ,The Star");
    assert_eq!(cards, vec!["The Fool", "The Star"]);
}

#[test]
fn empty_reply_yields_no_cards() {
    assert!(parse_card_list("").is_empty());
    assert!(parse_card_list("   ").is_empty());
}

#[test]
fn single_card_reply() {
    let cards = parse_card_list("The Fool");
    assert_eq!(cards, vec!["The Fool"]);
}

#[test]
fn identification_prompt_carries_the_query() {
    let prompt = identification_prompt("What does the Fool card mean?");
    assert!(prompt.starts_with("Identify all the cards"));
    assert!(prompt.ends_with("What does the Fool card mean?"));
    assert!(prompt.contains("comma-separated"));
}

#[test]
fn interpretation_prompt_carries_context_and_query() {
    let prompt = interpretation_prompt(
        "name: The Fool; meaning: beginnings",
        "What does the Fool card mean?",
    );

    assert!(prompt.contains("Context information is below."));
    assert!(prompt.contains("name: The Fool; meaning: beginnings"));
    assert!(prompt.contains("Query: What does the Fool card mean?"));
    assert!(prompt.contains("synchronicities"));
}
