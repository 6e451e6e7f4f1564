use idomizer::{compile, Helpers, Options, Primitives};
use serde_json::{json, Value};

/// Records every primitive call as one line, in call order.
#[derive(Debug, Default, Clone, PartialEq)]
struct Recorder {
    calls: Vec<String>,
}

fn pairs(list: Option<&[(String, String)]>) -> String {
    match list {
        None => "null".to_string(),
        Some(pairs) => {
            let rendered: Vec<String> =
                pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("[{}]", rendered.join(","))
        }
    }
}

impl Primitives for Recorder {
    fn element_open(
        &mut self,
        name: &str,
        key: Option<&str>,
        statics: Option<&[(String, String)]>,
        var_args: Option<&[(String, String)]>,
    ) {
        self.calls.push(format!(
            "open({}, {}, {}, {})",
            name,
            key.unwrap_or("null"),
            pairs(statics),
            pairs(var_args)
        ));
    }

    fn element_void(
        &mut self,
        name: &str,
        key: Option<&str>,
        statics: Option<&[(String, String)]>,
        var_args: Option<&[(String, String)]>,
    ) {
        self.calls.push(format!(
            "void({}, {}, {}, {})",
            name,
            key.unwrap_or("null"),
            pairs(statics),
            pairs(var_args)
        ));
    }

    fn element_close(&mut self, name: &str) {
        self.calls.push(format!("close({})", name));
    }

    fn text(&mut self, content: &str) {
        self.calls.push(format!("text({})", content));
    }

    fn skip(&mut self) {
        self.calls.push("skip()".to_string());
    }
}

fn render(template: &str, options: &Options, data: Option<&Value>) -> Vec<String> {
    let factory = compile(template, options).expect("Failed to compile template");
    let mut render = factory.bind(Recorder::default(), Helpers::new());
    render.call(data).expect("Failed to render template");
    render.into_inner().calls
}

#[test]
fn test_simple_h1_with_static_attribute() {
    let calls = render(r#"<h1 class="main">Hello</h1>"#, &Options::default(), None);
    assert_eq!(
        calls,
        vec!["open(h1, null, [class=main], null)", "text(Hello)", "close(h1)"]
    );
}

#[test]
fn test_static_template_ignores_data_changes() {
    let factory =
        compile(r#"<h1 class="main">Hello</h1>"#, &Options::default()).expect("compile");
    let mut render = factory.bind(Recorder::default(), Helpers::new());

    render.call(Some(&json!({"a": 1}))).expect("first render");
    let first = render.primitives().calls.clone();
    render.primitives_mut().calls.clear();
    render.call(Some(&json!({"b": 2}))).expect("second render");

    assert_eq!(first, render.primitives().calls);
}

#[test]
fn test_dynamic_attribute_updates_per_render() {
    let template = r#"<h1 class="foo {{ data.h1Class }} bar">Hello</h1>"#;
    let factory = compile(template, &Options::default()).expect("compile");
    let mut render = factory.bind(Recorder::default(), Helpers::new());

    render.call(Some(&json!({"h1Class": "main"}))).expect("render");
    assert_eq!(
        render.primitives().calls[0],
        "open(h1, null, null, [class=foo main bar])"
    );

    render.primitives_mut().calls.clear();
    render.call(Some(&json!({"h1Class": "child"}))).expect("render");
    assert_eq!(
        render.primitives().calls[0],
        "open(h1, null, null, [class=foo child bar])"
    );
}

#[test]
fn test_void_element_reissues_statics_with_updated_dynamics() {
    let options = Options {
        skip_exceptions: false,
        ..Options::default()
    };
    let template = r#"<input type="text" value="{{data.value}}">"#;
    let factory = compile(template, &options).expect("compile");
    let mut render = factory.bind(Recorder::default(), Helpers::new());

    render.call(Some(&json!({"value": "x"}))).expect("render");
    render.call(Some(&json!({"value": "y"}))).expect("render");
    assert_eq!(
        render.primitives().calls,
        vec![
            "void(input, null, [type=text], [value=x])",
            "void(input, null, [type=text], [value=y])",
        ]
    );
}

#[test]
fn test_text_directive_with_expression_value() {
    let calls = render(
        r#"<strong><tpl-text value="data.value"/></strong>"#,
        &Options::default(),
        Some(&json!({"value": "value"})),
    );
    assert_eq!(
        calls,
        vec!["open(strong, null, null, null)", "text(value)", "close(strong)"]
    );
}

#[test]
fn test_each_iterates_in_index_order() {
    let template = r#"<tpl-each items="data.items"><strong tpl-key="{{index}}"><tpl-text value="index"/><tpl-text value="item"/></strong></tpl-each>"#;
    let calls = render(
        template,
        &Options::default(),
        Some(&json!({"items": ["item0", "item1"]})),
    );
    assert_eq!(
        calls,
        vec![
            "open(strong, 0, null, null)",
            "text(0)",
            "text(item0)",
            "close(strong)",
            "open(strong, 1, null, null)",
            "text(1)",
            "text(item1)",
            "close(strong)",
        ]
    );

    // Growing the array grows the call sequence accordingly.
    let calls = render(
        template,
        &Options::default(),
        Some(&json!({"items": ["item0", "item1", "item2"]})),
    );
    assert_eq!(calls.len(), 12);
    assert_eq!(calls[8], "open(strong, 2, null, null)");
}

#[test]
fn test_each_with_custom_binding_names() {
    let template = r#"<tpl-each items="data.values" item="value" index="i"><li tpl-key="value-{{i}}"><tpl-text value="value"/></li></tpl-each>"#;
    let calls = render(
        template,
        &Options::default(),
        Some(&json!({"values": ["a", "b"]})),
    );
    assert_eq!(calls[0], "open(li, value-0, null, null)");
    assert_eq!(calls[1], "text(a)");
    assert_eq!(calls[4], "text(b)");
}

#[test]
fn test_each_tolerates_missing_and_null_iterables() {
    let template = r#"<tpl-each items="data.items"><p>never</p></tpl-each>"#;

    assert!(render(template, &Options::default(), Some(&json!({}))).is_empty());
    assert!(render(template, &Options::default(), Some(&json!({"items": null}))).is_empty());
    assert!(render(template, &Options::default(), None).is_empty());
}

#[test]
fn test_nested_each_shadows_outer_bindings() {
    let template = r#"<tpl-each items="data.rows" item="row"><tpl-each items="row"><tpl-text value="item"/></tpl-each></tpl-each>"#;
    let calls = render(
        template,
        &Options::default(),
        Some(&json!({"rows": [["a", "b"], ["c"]]})),
    );
    assert_eq!(calls, vec!["text(a)", "text(b)", "text(c)"]);
}

#[test]
fn test_conditional_chain_selects_exactly_one_branch() {
    let template = r#"
        <tpl-if expression="data.items.length === 1">
            <p>1 item</p>
        <tpl-else-if expression="data.items.length > 1" >
            <p>items</p>
        </tpl-else-if>
        <tpl-else />
            <p>no items</p>
        </tpl-if>
    "#;

    let one = render(
        template,
        &Options::default(),
        Some(&json!({"items": ["item0"]})),
    );
    assert!(one.contains(&"text(1 item)".to_string()), "calls: {:?}", one);
    assert!(!one.contains(&"text(items)".to_string()));
    assert!(!one.contains(&"text(no items)".to_string()));

    let many = render(
        template,
        &Options::default(),
        Some(&json!({"items": ["item0", "item1"]})),
    );
    assert!(many.contains(&"text(items)".to_string()));
    assert!(!many.contains(&"text(1 item)".to_string()));

    let none = render(template, &Options::default(), Some(&json!({"items": []})));
    assert!(none.contains(&"text(no items)".to_string()));
    assert!(!none.contains(&"text(1 item)".to_string()));
    assert!(!none.contains(&"text(items)".to_string()));
}

#[test]
fn test_text_interpolation_in_order() {
    let template = "<p>t {{ data.txtNode1 }} t {{ data.txtNode2 }} {{ }}</p>";
    let calls = render(
        template,
        &Options::default(),
        Some(&json!({"txtNode1": "value1", "txtNode2": "value2"})),
    );
    assert_eq!(
        calls,
        vec![
            "open(p, null, null, null)",
            "text(t )",
            "text(value1)",
            "text( t )",
            "text(value2)",
            "text( )",
            "close(p)",
        ]
    );
}

#[test]
fn test_skipped_exceptions_substitute_empty_strings() {
    let template =
        r#"<p class="a {{ data.att1 }} a {{ foo.bar }}">t {{ foo.bar }} t {{ data.txtNode2 }}</p>"#;
    let calls = render(
        template,
        &Options::default(),
        Some(&json!({"att1": "a1", "txtNode2": "value2"})),
    );
    assert_eq!(
        calls,
        vec![
            "open(p, null, null, [class=a a1 a ])",
            "text(t )",
            "text()",
            "text( t )",
            "text(value2)",
            "close(p)",
        ]
    );
}

#[test]
fn test_unskipped_exceptions_propagate() {
    let options = Options {
        skip_exceptions: false,
        ..Options::default()
    };
    let factory = compile("<p>{{ foo.bar }}</p>", &options).expect("compile");
    let mut render = factory.bind(Recorder::default(), Helpers::new());
    assert!(render.call(Some(&json!({}))).is_err());
}

#[test]
fn test_raw_code_spans_evaluate_without_output() {
    let calls = render(
        "<p>[[ data.touched ]]text</p>",
        &Options::default(),
        Some(&json!({"touched": true})),
    );
    assert_eq!(
        calls,
        vec!["open(p, null, null, null)", "text(text)", "close(p)"]
    );
}

#[test]
fn test_raw_code_failures_always_propagate() {
    // Raw code spans are never isolated, even with skip_exceptions on.
    let factory = compile("<p>[[ missing.path ]]</p>", &Options::default()).expect("compile");
    let mut render = factory.bind(Recorder::default(), Helpers::new());
    assert!(render.call(Some(&json!({}))).is_err());
}

#[test]
fn test_skip_attribute_emits_skip_call() {
    let calls = render(
        r#"<strong>a</strong><p tpl-skip></p><strong>b</strong>"#,
        &Options::default(),
        None,
    );
    assert_eq!(
        calls,
        vec![
            "open(strong, null, null, null)",
            "text(a)",
            "close(strong)",
            "open(p, null, null, null)",
            "skip()",
            "close(p)",
            "open(strong, null, null, null)",
            "text(b)",
            "close(strong)",
        ]
    );
}

#[test]
fn test_custom_elements_are_skipped_by_default() {
    let calls = render("<custom-element></custom-element>", &Options::default(), None);
    assert_eq!(
        calls,
        vec![
            "open(custom-element, null, null, null)",
            "skip()",
            "close(custom-element)",
        ]
    );
}

#[test]
fn test_custom_element_skip_deactivated_per_element() {
    let calls = render(
        r#"<custom-element tpl-skip="deactivated">content</custom-element>"#,
        &Options::default(),
        None,
    );
    assert_eq!(
        calls,
        vec![
            "open(custom-element, null, null, null)",
            "text(content)",
            "close(custom-element)",
        ]
    );
}

#[test]
fn test_custom_element_skip_deactivated_globally() {
    let options = Options {
        skip_custom_elements: false,
        ..Options::default()
    };
    let calls = render("<custom-element>content</custom-element>", &options, None);
    assert!(!calls.contains(&"skip()".to_string()));
}

#[test]
fn test_is_attribute_triggers_skip() {
    let calls = render(r#"<p is="custom-element"></p>"#, &Options::default(), None);
    assert_eq!(
        calls,
        vec!["open(p, null, [is=custom-element], null)", "skip()", "close(p)"]
    );
}

#[test]
fn test_is_attribute_skip_deactivated_per_element() {
    let calls = render(
        r#"<p is="custom-element" tpl-skip="deactivated">content</p>"#,
        &Options::default(),
        None,
    );
    assert!(!calls.contains(&"skip()".to_string()));
    assert!(calls.contains(&"text(content)".to_string()));
}

#[test]
fn test_ignored_static_attributes_render_like_statics() {
    let options = Options {
        ignore_static_attributes: true,
        ..Options::default()
    };
    let calls = render(
        r#"<h1 class="foo {{data.h1Class}} bar" id="anId">Hello</h1>"#,
        &options,
        Some(&json!({"h1Class": "main"})),
    );
    assert_eq!(calls[0], "open(h1, null, null, [class=foo main bar,id=anId])");
}

#[test]
fn test_helpers_delegation() {
    let sub = compile("helper content", &Options::default()).expect("compile helper");

    let mut helpers = Helpers::new();
    helpers.insert("subRender".to_string(), sub.into_helper());

    let factory = compile(
        r#"<strong>a</strong><tpl-call name="subRender" /><strong>b</strong>"#,
        &Options::default(),
    )
    .expect("compile outer");
    let mut render = factory.bind(Recorder::default(), helpers);
    render.call(Some(&json!({}))).expect("render");

    assert_eq!(
        render.primitives().calls,
        vec![
            "open(strong, null, null, null)",
            "text(a)",
            "close(strong)",
            "text(helper content)",
            "open(strong, null, null, null)",
            "text(b)",
            "close(strong)",
        ]
    );
}

#[test]
fn test_unknown_helper_fails_the_render_call() {
    let factory =
        compile(r#"<tpl-call name="nope" />"#, &Options::default()).expect("compile");
    let mut render = factory.bind(Recorder::default(), Helpers::new());
    assert!(render.call(None).is_err());
}

#[test]
fn test_user_tag_overrides_built_in() {
    use idomizer::{Instruction, ParsedAttributes, RawAttrs, TagHandler, TagHandlers};
    use std::sync::Arc;

    struct XTest;
    impl TagHandler for XTest {
        fn on_open(
            &self,
            name: &str,
            _attrs: &RawAttrs,
            _parsed: &ParsedAttributes,
            _options: &Options,
        ) -> idomizer::Result<Vec<Instruction>> {
            Ok(vec![Instruction::Text {
                content: format!("{} element", name),
            }])
        }
    }

    let mut tags = TagHandlers::new();
    tags.insert("x-test".to_string(), Arc::new(XTest) as _);
    let options = Options {
        tags,
        ..Options::default()
    };

    let calls = render(
        "<strong>strong text</strong><x-test></x-test><strong>strong text</strong>",
        &options,
        None,
    );
    assert_eq!(
        calls,
        vec![
            "open(strong, null, null, null)",
            "text(strong text)",
            "close(strong)",
            "text(x-test element)",
            "open(strong, null, null, null)",
            "text(strong text)",
            "close(strong)",
        ]
    );
}

#[test]
fn test_missing_data_renders_like_an_empty_object() {
    let template = "<p>{{ data.missing }}</p>";
    let with_none = render(template, &Options::default(), None);
    let with_empty = render(template, &Options::default(), Some(&json!({})));
    assert_eq!(with_none, with_empty);
    assert_eq!(
        with_none,
        vec!["open(p, null, null, null)", "text()", "close(p)"]
    );
}

#[test]
fn test_unicode_text_and_interpolation() {
    let calls = render(
        "<p>héllo {{ data.name }} 世界</p>",
        &Options::default(),
        Some(&json!({"name": "νεφέλη"})),
    );
    assert_eq!(
        calls,
        vec![
            "open(p, null, null, null)",
            "text(héllo )",
            "text(νεφέλη)",
            "text( 世界)",
            "close(p)",
        ]
    );
}

#[test]
fn test_unclosed_void_element_inside_content() {
    let calls = render(r#"<p><input type="text"></p>"#, &Options::default(), None);
    assert_eq!(
        calls,
        vec![
            "open(p, null, null, null)",
            "void(input, null, [type=text], null)",
            "close(p)",
        ]
    );
}

mod logger {
    use super::*;
    use std::sync::Mutex;

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            CAPTURED
                .lock()
                .expect("logger mutex")
                .push(format!("{} {}", record.level(), record.args()));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    #[test]
    fn test_logger_directive_emits_through_log_facade() {
        log::set_logger(&LOGGER).expect("install capture logger");
        log::set_max_level(log::LevelFilter::Trace);

        let template = r#"<tpl-logger level="warn" content="'low: ' + data.disk" />"#;
        let calls = render(template, &Options::default(), Some(&json!({"disk": "90%"})));
        assert!(calls.is_empty(), "logging must not touch the primitives");

        let captured = CAPTURED.lock().expect("logger mutex");
        assert!(
            captured.iter().any(|line| line == "WARN low: 90%"),
            "captured: {:?}",
            captured
        );
    }
}
