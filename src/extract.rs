use once_cell::sync::Lazy;
use regex::Regex;

/// First bracketed token, shortest match. `.` stops at newlines, so a token never spans lines.
static BRACKETED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(.+?)\]").expect("bracketed token pattern is valid")
});

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no bracketed query found in alert text")]
    NoMatch,
}

/// Extract the log query from a monitor alert body.
///
/// Monitor notifications render the monitored query as a markdown link,
/// `[host:x filename:y](https://...)`, so the text of the first bracketed
/// token is the query.
pub fn extract_query(text: &str) -> Result<&str, ExtractError> {
    BRACKETED
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str())
        .ok_or(ExtractError::NoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITOR_BODY: &str = "%%%\nlet me show the messageid:  @webhook-relay\n\n\n\nMore than **0** log events matched in the last **1m** against the monitored query: **[host:centos72 filename:jack.log](https://app.datadoghq.com/logs?query=host%3Acentos72+filename%3Ajack.log&agg_m=count&agg_t=count&index=)**\n\nThe monitor was last triggered at Fri Apr 09 2021 01:31:22 UTC.\n\n- - -\n\n[[Monitor Status](https://app.datadoghq.com/monitors#33326302?group=total)] \u{b7} [[Edit Monitor](https://app.datadoghq.com/monitors#33326302/edit)]\n%%%";

    #[test]
    fn extracts_monitored_query() {
        assert_eq!(
            extract_query(MONITOR_BODY),
            Ok("host:centos72 filename:jack.log")
        );
    }

    #[test]
    fn no_brackets() {
        assert_eq!(extract_query("no brackets here"), Err(ExtractError::NoMatch));
    }

    #[test]
    fn unterminated_or_empty_brackets() {
        assert_eq!(extract_query("open [ but never closed"), Err(ExtractError::NoMatch));
        assert_eq!(extract_query("closed ] before [ open"), Err(ExtractError::NoMatch));
        assert_eq!(extract_query("[]"), Err(ExtractError::NoMatch));
        assert_eq!(extract_query(""), Err(ExtractError::NoMatch));
    }

    #[test]
    fn first_token_wins() {
        assert_eq!(extract_query("[first] then [second]"), Ok("first"));
    }

    #[test]
    fn shortest_match_does_not_swallow_neighbours() {
        assert_eq!(extract_query("a [b] c] d"), Ok("b"));
        // The shortest match starting at the first `[` runs to the first `]`.
        assert_eq!(extract_query("[[Monitor Status](x)]"), Ok("[Monitor Status"));
    }

    #[test]
    fn token_does_not_span_lines() {
        assert_eq!(extract_query("[broken\nlink] [ok]"), Ok("ok"));
    }

    #[test]
    fn repeated_calls_agree() {
        assert_eq!(extract_query(MONITOR_BODY), extract_query(MONITOR_BODY));
    }
}
