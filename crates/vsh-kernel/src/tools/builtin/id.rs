//! whoami, id — Print the current identity.

use async_trait::async_trait;
use vsh_types::{ArgConstraint, ExecResult, ToolArgs, ToolSchema};

use crate::tools::{ExecContext, Tool};

/// Whoami tool: print the current user name.
pub struct Whoami;

#[async_trait]
impl Tool for Whoami {
    fn name(&self) -> &str {
        "whoami"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("whoami", "Print the current user name").args(ArgConstraint::exact(0))
    }

    async fn execute(&self, _args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success(format!("{}\n", ctx.identity.user))
    }
}

/// Id tool: print the user and group memberships.
pub struct Id;

#[async_trait]
impl Tool for Id {
    fn name(&self) -> &str {
        "id"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("id", "Print user and group information").args(ArgConstraint::exact(0))
    }

    async fn execute(&self, _args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success(format!(
            "user={} group={} groups={}\n",
            ctx.identity.user,
            ctx.identity.primary_group(),
            ctx.identity.groups.join(",")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::testing::{alice, args, make_ctx};

    #[tokio::test]
    async fn test_identity_commands() {
        let mut ctx = make_ctx(alice());
        assert_eq!(Whoami.execute(args(&[]), &mut ctx).await.out, "alice\n");
        assert_eq!(
            Id.execute(args(&[]), &mut ctx).await.out,
            "user=alice group=alice groups=alice,staff\n"
        );
    }
}
