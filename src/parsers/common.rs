use once_cell::sync::Lazy;
use regex::Regex;

// `<@U123>`, `<#C123|general>`, `<!here>`, `<https://example.com|label>`
static SLACK_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[@#!]?[^<>\s]*(\|[^<>]*)?>").expect("slack markup pattern compiles")
});

pub struct MessageUtils;

impl MessageUtils {
    /// Blanks out Slack control sequences so the analyzer only sees prose.
    pub fn strip_slack_markup(text: &str) -> String {
        SLACK_MARKUP.replace_all(text, " ").into_owned()
    }

    pub fn format_mention(user_id: &str) -> String {
        format!("<@{}>", user_id)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::MessageUtils;

    #[test_case("<@U1> 予算について教えて", "  予算について教えて" ; "leading mention")]
    #[test_case("経費は<#C42|general>で", "経費は で" ; "channel link")]
    #[test_case("<!here> 休暇", "  休暇" ; "broadcast")]
    #[test_case("詳細は<https://example.com/faq|FAQ>を参照", "詳細は を参照" ; "labelled url")]
    #[test_case("plain text", "plain text" ; "no markup")]
    fn strip_slack_markup_blanks_control_sequences(input: &str, expected: &str) {
        assert_eq!(MessageUtils::strip_slack_markup(input), expected);
    }

    #[test]
    fn format_mention_wraps_user_id() {
        assert_eq!(MessageUtils::format_mention("U1"), "<@U1>");
    }
}
