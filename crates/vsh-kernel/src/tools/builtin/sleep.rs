//! sleep — Delay for a specified time.
//!
//! The wait is cancellable: cancelling the job ends it at once with a
//! `Cancelled` result.

use std::time::Duration;

use async_trait::async_trait;
use vsh_types::{ArgConstraint, ExecResult, ToolArgs, ToolSchema};

use crate::error::ShellError;
use crate::tools::{ExecContext, Tool};

/// Sleep tool: pause execution for a specified duration.
pub struct Sleep;

#[async_trait]
impl Tool for Sleep {
    fn name(&self) -> &str {
        "sleep"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("sleep", "Delay for a specified time")
            .args(ArgConstraint::exact(1))
            .example("Sleep for 1 second", "sleep 1")
            .example("Sleep for half a second", "sleep 0.5")
            .example("Sleep in the background", "sleep 5m &")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let seconds = match args.get_positional(0).map(parse_duration) {
            Some(Ok(s)) => s,
            Some(Err(e)) => return ExecResult::failure(1, format!("sleep: {}", e)),
            None => return ExecResult::failure(1, "sleep: missing seconds argument"),
        };

        let Ok(duration) = Duration::try_from_secs_f64(seconds) else {
            return ExecResult::failure(1, "sleep: time interval too large");
        };

        tokio::select! {
            _ = ctx.cancel.cancelled() => ShellError::Cancelled.into_exec("sleep"),
            _ = tokio::time::sleep(duration) => ExecResult::success(""),
        }
    }
}

/// Parse duration string with optional suffix (s, m, h, d).
fn parse_duration(s: &str) -> Result<f64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("missing operand".to_string());
    }

    let (num_str, multiplier) = if let Some(rest) = s.strip_suffix('s') {
        (rest, 1.0)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60.0)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3600.0)
    } else if let Some(rest) = s.strip_suffix('d') {
        (rest, 86400.0)
    } else {
        (s, 1.0)
    };

    match num_str.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n * multiplier),
        _ => Err(format!("invalid time interval '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::tools::builtin::testing::{args, make_ctx};
    use std::time::Instant;
    use vsh_types::ErrorKind;

    #[tokio::test]
    async fn test_sleep_zero() {
        let mut ctx = make_ctx(Identity::root());
        let result = Sleep.execute(args(&["0"]), &mut ctx).await;
        assert!(result.ok());
    }

    #[tokio::test]
    async fn test_sleep_waits() {
        let mut ctx = make_ctx(Identity::root());
        let start = Instant::now();
        let result = Sleep.execute(args(&["0.05"]), &mut ctx).await;
        assert!(result.ok());
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_sleep_cancelled() {
        let mut ctx = make_ctx(Identity::root());
        let token = ctx.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let start = Instant::now();
        let result = Sleep.execute(args(&["60"]), &mut ctx).await;
        assert_eq!(result.kind, Some(ErrorKind::Cancelled));
        assert_eq!(result.err, "sleep: cancelled");
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_sleep_invalid() {
        let mut ctx = make_ctx(Identity::root());
        assert!(!Sleep.execute(args(&["-1"]), &mut ctx).await.ok());
        assert!(!Sleep.execute(args(&["abc"]), &mut ctx).await.ok());
    }

    #[test]
    fn test_parse_duration() {
        assert!((parse_duration("1").unwrap() - 1.0).abs() < f64::EPSILON);
        assert!((parse_duration("1.5").unwrap() - 1.5).abs() < f64::EPSILON);
        assert!((parse_duration("1m").unwrap() - 60.0).abs() < f64::EPSILON);
        assert!((parse_duration("0.5h").unwrap() - 1800.0).abs() < f64::EPSILON);
        assert!(parse_duration("abc").is_err());
    }
}
