use crate::schema::SchemaContext;

/// Build the NL2SQL instruction prompt for one question against one table.
pub fn render_prompt(query: &str, schema: &SchemaContext) -> String {
  let table = &schema.table_name;
  let sample_count = schema.sample.len();
  format!(
    r#"You are a software engineer who converts natural language questions into SQL queries. Follow the instructions closely.

# Instructions
- Always read the 'Database info' section carefully before writing the SQL query
- Always follow the output format below
- ONLY include the SQL query in your response

# Database info
<column_info table_name="{table}">
Columns of the table:
{columns}
</column_info>

<table_sample table_name="{table}">
The first {sample_count} rows of the table:
{sample}
</table_sample>

# Output format
Always answer with exactly this JSON object:
{{"sql_query": <sql_query>}}

# Natural language query
{query}
"#,
    columns = schema.column_info_text(),
    sample = schema.sample_text(),
  )
}
