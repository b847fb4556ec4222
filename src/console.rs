//! Terminal front end: reads invocations and answers prompts on stdin

use async_trait::async_trait;
use foxhelp_core::{Session, SuggestPrompt, Suggester};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Shared line reader over stdin
#[derive(Clone)]
pub struct Console {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// Next input line, `None` at end of input
    pub async fn next_line(&self) -> std::io::Result<Option<String>> {
        self.lines.lock().await.next_line().await
    }
}

/// Pick a candidate by its number or its name
fn choose(expect: &[String], answer: &str) -> Option<String> {
    let answer = answer.trim();
    if let Ok(index) = answer.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| expect.get(i)).cloned();
    }
    expect.iter().find(|name| name.eq_ignore_ascii_case(answer)).cloned()
}

#[async_trait]
impl Suggester for Console {
    async fn suggest(&self, _session: &Session, prompt: SuggestPrompt) -> Option<String> {
        println!("{}", prompt.prefix);
        if prompt.expect.is_empty() {
            return None;
        }
        for (i, name) in prompt.expect.iter().enumerate() {
            println!("  {}. {}", i + 1, name);
        }
        println!("{}", prompt.suffix);

        match self.next_line().await {
            Ok(Some(answer)) => choose(&prompt.expect, &answer),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read answer: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_by_number_or_name() {
        let expect = vec!["echo".to_string(), "echelon".to_string()];
        assert_eq!(choose(&expect, "2"), Some("echelon".to_string()));
        assert_eq!(choose(&expect, " ECHO "), Some("echo".to_string()));
        assert_eq!(choose(&expect, "0"), None);
        assert_eq!(choose(&expect, "3"), None);
        assert_eq!(choose(&expect, "no"), None);
    }
}
