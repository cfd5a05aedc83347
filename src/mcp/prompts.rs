//! Static prompts.

use rmcp::model::{GetPromptResult, Prompt, PromptMessage, PromptMessageRole};

pub const BEST_PRACTICES: &str = "best_practices";
pub const LIST_TABLES: &str = "list_tables";

const BEST_PRACTICES_TEXT: &str = r#"Guidelines for Steampipe SQL:

1. Answer style
   - Show results as a markdown table and keep commentary short.
   - Explain a query only where something is non-obvious, or when reworking one after an error.

2. Discover, never guess
   - Find schemas with schema_list, tables with table_list and columns with table_show.
   - Do not put a LIMIT on catalog queries; you need the whole list.

3. Select only the columns you need
   - Every column can cost extra API calls. Avoid select *.
   - Bad:  select * from aws_iam_user
   - Good: select user_name, arn from aws_iam_user

4. Joining data
   - Prefer materialized CTEs over direct joins so each table is fetched once:
       with users as materialized (
         select user_name, arn
         from aws_iam_user
       )
   - Plain selects are fine when no join is needed.

5. Filter early
   - Put where clauses on key columns so the plugin can narrow its API calls.
   - Use LIMIT while exploring data.

6. Formatting
   - Lowercase keywords, two-space indentation, one column per line.

Example:
with admins as materialized (
  select user_name, policy_name
  from aws_iam_user_policy
  where policy_name like 'Admin%'
)
select
  u.user_name,
  u.arn,
  a.policy_name
from aws_iam_user u
join admins a using (user_name)
order by u.user_name;"#;

const LIST_TABLES_TEXT: &str = r#"Each Steampipe connection is a schema, and its tables are named <plugin>_<resource>.

1. Call schema_list to see the connections.
2. Call table_list with a schema (for example "aws") to see its tables and descriptions.
3. Call table_show with a table name to see its columns before writing a query.

The same information is available through SQL:

select table_schema, table_name
from information_schema.tables
where table_schema not in ('information_schema', 'pg_catalog')
order by table_schema, table_name;"#;

pub fn list() -> Vec<Prompt> {
    vec![
        Prompt::new(
            BEST_PRACTICES,
            Some("Best practices for writing Steampipe SQL queries"),
            None,
        ),
        Prompt::new(
            LIST_TABLES,
            Some("How to find the tables available in Steampipe"),
            None,
        ),
    ]
}

/// The conversation for prompt `name`, or `None` when there is no such prompt.
pub fn get(name: &str) -> Option<GetPromptResult> {
    let (description, question, answer) = match name {
        BEST_PRACTICES => (
            "Best practices for writing Steampipe SQL queries",
            "What are the best practices for writing Steampipe SQL queries?",
            BEST_PRACTICES_TEXT,
        ),
        LIST_TABLES => (
            "How to find the tables available in Steampipe",
            "How do I see what tables are available in Steampipe?",
            LIST_TABLES_TEXT,
        ),
        _ => return None,
    };

    Some(GetPromptResult {
        description: Some(description.to_string()),
        messages: vec![
            PromptMessage::new_text(PromptMessageRole::User, question),
            PromptMessage::new_text(PromptMessageRole::Assistant, answer),
        ],
    })
}
