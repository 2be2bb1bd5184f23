use crate::config::PromptPair;
use crate::error::Result;
use crate::provider::ChatModel;
use serde_json::Value;
use tracing::debug;

/// Bound combination of prompt templates, schema constraint and chat client.
///
/// One chain turns one input record into one structured output record.
pub struct Chain<'a> {
    client: &'a dyn ChatModel,
    schema: &'a Value,
    prompts: &'a PromptPair,
}

impl<'a> Chain<'a> {
    /// Binds a client, an output schema and a prompt pair into a chain.
    #[must_use]
    pub fn new(client: &'a dyn ChatModel, schema: &'a Value, prompts: &'a PromptPair) -> Self {
        Self {
            client,
            schema,
            prompts,
        }
    }

    /// Runs one input record through the chain.
    ///
    /// Both prompt templates are rendered with the record's fields before the
    /// schema-constrained call; schema conformance of the reply is the
    /// provider's responsibility.
    ///
    /// # Errors
    ///
    /// Returns provider and decode errors from the underlying client.
    pub fn invoke(&self, item: &Value) -> Result<Value> {
        let system = render_prompt(&self.prompts.system, item);
        let user = render_prompt(&self.prompts.user, item);
        self.client.generate_structured(&system, &user, self.schema)
    }

    /// Runs every input record through the chain, preserving input order.
    ///
    /// Whole-batch semantics: the first failing item aborts the batch and no
    /// partial result list is returned.
    ///
    /// # Errors
    ///
    /// Returns the first per-item error encountered.
    pub fn batch(&self, items: &[Value]) -> Result<Vec<Value>> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                debug!("invoking chain for item {}/{}", index + 1, items.len());
                self.invoke(item)
            })
            .collect()
    }
}

/// Substitutes `{field}` placeholders in a template with the record's fields.
///
/// Fields missing from the record leave their placeholders untouched; string
/// values substitute verbatim, anything else as its JSON rendering.
fn render_prompt(template: &str, item: &Value) -> String {
    let Some(fields) = item.as_object() else {
        return template.to_string();
    };

    let mut rendered = template.to_string();
    for (name, value) in fields {
        let placeholder = format!("{{{name}}}");
        if rendered.contains(&placeholder) {
            rendered = rendered.replace(&placeholder, &value_as_text(value));
        }
    }
    rendered
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use std::cell::RefCell;

    /// Chat model stub that records calls and replays canned replies.
    struct StubModel {
        calls: RefCell<Vec<(String, String)>>,
        replies: RefCell<Vec<Result<Value>>>,
    }

    impl StubModel {
        fn new(replies: Vec<Result<Value>>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                replies: RefCell::new(replies),
            }
        }
    }

    impl ChatModel for StubModel {
        fn generate_structured(&self, system: &str, user: &str, _schema: &Value) -> Result<Value> {
            self.calls
                .borrow_mut()
                .push((system.to_string(), user.to_string()));
            self.replies.borrow_mut().remove(0)
        }

        fn generate_text(&self, _prompt: &str) -> Result<String> {
            unimplemented!("not used by chains")
        }
    }

    fn prompts() -> PromptPair {
        PromptPair {
            system: "You answer about {topic}.".to_string(),
            user: "Question: {query}".to_string(),
        }
    }

    #[test]
    fn test_render_prompt_substitutes_fields() {
        let item = json!({"query": "foo", "count": 3});
        assert_eq!(
            render_prompt("Q: {query} ({count} times)", &item),
            "Q: foo (3 times)"
        );
    }

    #[test]
    fn test_render_prompt_leaves_unknown_placeholders() {
        let item = json!({"query": "foo"});
        assert_eq!(render_prompt("{query} / {missing}", &item), "foo / {missing}");
    }

    #[test]
    fn test_render_prompt_non_object_item() {
        assert_eq!(render_prompt("static {x}", &json!("scalar")), "static {x}");
    }

    #[test]
    fn test_invoke_renders_both_messages() {
        let model = StubModel::new(vec![Ok(json!({"result": "ok"}))]);
        let schema = json!({"type": "object"});
        let pair = prompts();
        let chain = Chain::new(&model, &schema, &pair);

        let result = chain
            .invoke(&json!({"topic": "rivers", "query": "longest?"}))
            .unwrap();
        assert_eq!(result, json!({"result": "ok"}));

        let calls = model.calls.borrow();
        assert_eq!(calls[0].0, "You answer about rivers.");
        assert_eq!(calls[0].1, "Question: longest?");
    }

    #[test]
    fn test_batch_preserves_order() {
        let model = StubModel::new(vec![
            Ok(json!({"result": "first"})),
            Ok(json!({"result": "second"})),
        ]);
        let schema = json!({"type": "object"});
        let pair = prompts();
        let chain = Chain::new(&model, &schema, &pair);

        let items = vec![
            json!({"topic": "a", "query": "1"}),
            json!({"topic": "b", "query": "2"}),
        ];
        let results = chain.batch(&items).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], json!({"result": "first"}));
        assert_eq!(results[1], json!({"result": "second"}));
    }

    #[test]
    fn test_batch_aborts_on_first_failure() {
        let model = StubModel::new(vec![
            Ok(json!({"result": "first"})),
            Err(Error::decode("not JSON")),
            Ok(json!({"result": "third"})),
        ]);
        let schema = json!({"type": "object"});
        let pair = prompts();
        let chain = Chain::new(&model, &schema, &pair);

        let items = vec![json!({"query": "1"}), json!({"query": "2"}), json!({"query": "3"})];
        let err = chain.batch(&items).unwrap_err();
        assert!(err.to_string().contains("not JSON"));

        // The third item was never submitted.
        assert_eq!(model.calls.borrow().len(), 2);
    }
}
