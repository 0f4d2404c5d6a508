//! Integration tests for the request cycle.
//!
//! Tests cover:
//! 1. Resolving and compiling sources
//! 2. Showing forms (empty, pre-filled, read-only)
//! 3. Submissions: errors, handled, declined
//! 4. Pages and template context

use std::sync::Arc;

use mdform_core::{FormatterChoice, MdFormError, Settings};
use mdform_forms::{FieldDescriptor, FieldValue, PlainDict};
use mdform_http::{FormRequest, UploadedFile};
use mdform_template::{FnFormatter, Formatter, PlainFormatter};
use mdform_views::{
    ClassName, FormResponse, JsonSourceParser, MdForms, Prefill, RenderOptions, SubmitOutcome,
};
use serde_json::{json, Map, Value};

// ============================================================================
// Shared helpers
// ============================================================================

const RENDERED_INDEX: &str = "
<p>Welcome to the form tester</p>
<p><label for=\"name\">name</label> <input id=\"name\" maxlength=\"30\" name=\"name\" required type=\"text\" value=\"\">
<label for=\"email\">email</label> <input id=\"email\" name=\"email\" required type=\"email\" value=\"\">
<label for=\"day\">day</label> <input id=\"day\" name=\"day\" required type=\"date\" value=\"\">
<label for=\"time\">time</label> <input id=\"time\" name=\"time\" required type=\"time\" value=\"\">
<label for=\"skipme\">skipme</label> <input id=\"skipme\" name=\"skipme\" type=\"text\" value=\"\"></p>";

const RENDERED_INDEX_PETER: &str = "
<p>Welcome to the form tester</p>
<p><label for=\"name\">name</label> <input id=\"name\" maxlength=\"30\" name=\"name\" required type=\"text\" value=\"Peter Capusotto\">
<label for=\"email\">email</label> <input id=\"email\" name=\"email\" required type=\"email\" value=\"peter@capusotto.com\">
<label for=\"day\">day</label> <input id=\"day\" name=\"day\" required type=\"date\" value=\"2020-12-23\">
<label for=\"time\">time</label> <input id=\"time\" name=\"time\" required type=\"time\" value=\"02:18\">
<label for=\"skipme\">skipme</label> <input id=\"skipme\" name=\"skipme\" type=\"text\" value=\"123\"></p>";

const RENDERED_INDEX_PETER_RO: &str = "
<p>Welcome to the form tester</p>
<p><label for=\"name\">name</label> <input disabled id=\"name\" maxlength=\"30\" name=\"name\" readonly required type=\"text\" value=\"Peter Capusotto\">
<label for=\"email\">email</label> <a href='mailto:peter@capusotto.com'>peter@capusotto.com</a>
<label for=\"day\">day</label> <input disabled id=\"day\" name=\"day\" readonly required type=\"date\" value=\"2020-12-23\">
<label for=\"time\">time</label> <input disabled id=\"time\" name=\"time\" readonly required type=\"time\" value=\"02:18\">
<label for=\"skipme\">skipme</label> <input disabled id=\"skipme\" name=\"skipme\" readonly type=\"text\" value=\"123\"></p>";

const PETER_BODY: &[u8] =
    b"name=Peter+Capusotto&email=peter%40capusotto.com&day=2020-12-23&time=02%3A18&skipme=123";

/// The index source, stored in the parsed JSON form.
fn index_source() -> String {
    json!({
        "meta": {"title": ["Index"]},
        "html": "<p>Welcome to the form tester</p>\n<p>[[name]]\n[[email]]\n[[day]]\n[[time]]\n[[skipme]]</p>",
        "fields": {
            "name": {"name": "name", "label": "name", "type": "StringField", "required": true, "length": 30},
            "email": {"name": "email", "label": "email", "type": "EmailField", "required": true},
            "day": {"name": "day", "label": "day", "type": "DateField", "required": true},
            "time": {"name": "time", "label": "time", "type": "TimeField", "required": true},
            "skipme": {"name": "skipme", "label": "skipme", "type": "StringField"}
        }
    })
    .to_string()
}

fn forms_with(settings: Settings) -> MdForms {
    let forms = MdForms::new(settings, JsonSourceParser);
    let engine = forms.engine();
    engine.add_string_template("form.html", "{% block innerform %}{% endblock %}");
    engine.add_string_template("simple.html", "<main>{% block inner_simple %}{% endblock %}</main>");
    engine.add_string_template("md/index.md", &index_source());
    engine.add_string_template(
        "md/about.md",
        r#"{"meta": {"title": ["About"]}, "html": "<h1>{{ meta.title.0 }}</h1><p>{{ owner }} / {{ site }}</p>"}"#,
    );
    forms
}

fn forms() -> MdForms {
    forms_with(Settings::default())
}

fn get(endpoint: &str) -> FormRequest {
    FormRequest::builder().method(http::Method::GET).endpoint(endpoint).build()
}

fn post(endpoint: &str, body: &[u8]) -> FormRequest {
    FormRequest::builder()
        .method(http::Method::POST)
        .endpoint(endpoint)
        .content_type("application/x-www-form-urlencoded")
        .body(body.to_vec())
        .build()
}

fn peter() -> PlainDict {
    serde_json::from_value(json!({
        "name": "Peter Capusotto",
        "email": "peter@capusotto.com",
        "day": "2020-12-23",
        "time": "02:18",
        "skipme": "123",
    }))
    .unwrap()
}

fn html<R>(response: FormResponse<R>) -> String {
    match response {
        FormResponse::Rendered(html) => html,
        FormResponse::Submitted(_) => panic!("expected a rendered page"),
    }
}

// ============================================================================
// 1. Resolving and compiling sources
// ============================================================================

#[test]
fn test_source_name_resolution() {
    let forms = forms();
    assert_eq!(forms.source_name(&get("index"), &RenderOptions::default()).unwrap(), "index");
    assert_eq!(
        forms.source_name(&get("forms.user.edit"), &RenderOptions::default()).unwrap(),
        "forms/user/edit"
    );
    let with_arg = FormRequest::builder().endpoint("forms.any").view_arg("mdfile", "index").build();
    assert_eq!(forms.source_name(&with_arg, &RenderOptions::default()).unwrap(), "index");
    assert_eq!(
        forms.source_name(&with_arg, &RenderOptions::source("about")).unwrap(),
        "about"
    );
    assert!(matches!(
        forms.source_name(&FormRequest::builder().build(), &RenderOptions::default()),
        Err(MdFormError::BadRequest(_))
    ));
}

#[test]
fn test_missing_source() {
    let forms = forms();
    let mut request = get("nowhere");
    assert!(matches!(
        forms.render_mdform::<()>(&mut request, None, None, &RenderOptions::default()),
        Err(MdFormError::SourceDoesNotExist(path)) if path == "md/nowhere.md"
    ));
}

#[test]
fn test_compiled_forms_are_cached() {
    let forms = forms();
    for _ in 0..3 {
        let mut request = get("index");
        forms.render_mdform::<()>(&mut request, None, None, &RenderOptions::default()).unwrap();
    }
    assert_eq!(forms.cache().len(), 1);

    let mut request = get("index");
    forms
        .render_mdform::<()>(&mut request, None, None, &RenderOptions::default().read_only(true))
        .unwrap();
    assert_eq!(forms.cache().len(), 2);
}

#[test]
fn test_derived_class_name() {
    let forms = forms().with_class_name(ClassName::Derived(Arc::new(|name: &str| {
        format!("{}Form", name.to_uppercase())
    })));
    let compiled = forms
        .compiled("index", false, "form.html", "innerform", &RenderOptions::default())
        .unwrap();
    assert_eq!(compiled.form_type.name(), "INDEXForm");
}

// ============================================================================
// 2. Showing forms
// ============================================================================

#[test]
fn test_render_empty_form() {
    let forms = forms();
    let mut request = get("index");
    let out = forms
        .render_mdform::<()>(&mut request, None, None, &RenderOptions::default())
        .unwrap();
    assert_eq!(html(out), RENDERED_INDEX.trim_start());
}

#[test]
fn test_get_form_prefilled() {
    let forms = forms();
    let mut request = get("index");
    let out = forms
        .get_form(&mut request, &RenderOptions::default(), |_| Ok(Prefill::from(peter())))
        .unwrap();
    assert_eq!(out, RENDERED_INDEX_PETER.trim_start());
}

#[test]
fn test_get_form_read_only() {
    let forms = forms();
    let mut request = get("index");
    let out = forms
        .get_form(&mut request, &RenderOptions::default().read_only(true), |_| {
            Ok(Prefill::from(peter()))
        })
        .unwrap();
    assert_eq!(out, RENDERED_INDEX_PETER_RO.trim_start());
}

#[test]
fn test_get_form_rejects_unknown_keys() {
    let forms = forms();
    let mut request = get("index");
    let result = forms.get_form(&mut request, &RenderOptions::default(), |_| {
        let mut data = peter();
        data.insert("nickname".to_string(), json!("Pete"));
        Ok(Prefill::from(data))
    });
    assert!(matches!(result, Err(MdFormError::UnknownField(name)) if name == "nickname"));
}

#[test]
fn test_bootstrap_formatter_from_settings() {
    let settings = Settings {
        formatter: FormatterChoice::Bootstrap {
            jquery_var: Some("jQuery".into()),
            prefix: "wtf_".into(),
        },
        ..Settings::default()
    };
    let forms = forms_with(settings);
    let mut request = get("index");
    let out = html(
        forms
            .render_mdform::<()>(&mut request, None, None, &RenderOptions::default())
            .unwrap(),
    );
    assert!(out.contains(
        r#"<div class="form-group row required"><label class="col-form-label col-lg-2" for="name">name</label>"#
    ));
    assert!(out.contains(r#"class="form-control" id="name" maxlength="30""#));
}

// ============================================================================
// 3. Submissions
// ============================================================================

#[test]
fn test_invalid_submission_flashes_errors() {
    let forms = forms();
    let mut request = post("index", b"name=&email=&day=&time=&skipme=");
    let out = forms
        .submit_form(&mut request, &RenderOptions::default(), |_, _| -> mdform_core::MdFormResult<SubmitOutcome<()>> {
            panic!("invalid submissions never reach the handler")
        })
        .unwrap();
    assert_eq!(html(out), RENDERED_INDEX.trim_start());

    let messages: Vec<_> = request.messages().iter().map(|m| m.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Error in the name field - This field is required.",
            "Error in the email field - This field is required.",
            "Error in the day field - This field is required.",
            "Error in the time field - This field is required.",
        ]
    );
    assert!(request.messages().iter().all(|m| m.tags() == "danger"));
}

#[test]
fn test_flash_can_be_disabled() {
    let forms = forms();
    let mut request = post("index", b"name=");
    forms
        .render_mdform::<()>(&mut request, None, None, &RenderOptions::default().flash(false))
        .unwrap();
    assert!(request.messages().is_empty());
}

#[test]
fn test_handled_submission() {
    let forms = forms();
    let mut request = post("index", PETER_BODY);
    let out = forms
        .submit_form(&mut request, &RenderOptions::default(), |form, _| {
            assert_eq!(
                form.value("name"),
                Some(&FieldValue::Text("Peter Capusotto".into()))
            );
            Ok(SubmitOutcome::Done(http::Response::new("saved".to_string())))
        })
        .unwrap();
    let response = out.into_response();
    assert_eq!(response.body(), "saved");
    assert!(request.messages().is_empty());
}

#[test]
fn test_declined_submission_renders_read_only() {
    let forms = forms();
    let mut request = post("index", PETER_BODY);
    let out = forms
        .submit_form(&mut request, &RenderOptions::default(), |_, _| {
            Ok(SubmitOutcome::<()>::NotHandled)
        })
        .unwrap();
    assert_eq!(html(out), RENDERED_INDEX_PETER_RO.trim_start());
}

#[test]
fn test_declined_submission_keeps_links() {
    let forms = forms();
    forms.engine().add_string_template(
        "md/links.md",
        &json!({
            "html": "<p>[[name]]</p><p>[[site]]</p>",
            "fields": {
                "name": {"name": "name", "label": "name", "type": "StringField"},
                "site": {"name": "site", "label": "site", "type": "LinkField"}
            }
        })
        .to_string(),
    );
    let mut request = post("links", b"name=Peter&site=https%3A%2F%2Fx.org");
    let out = forms
        .submit_form(&mut request, &RenderOptions::default(), |_, _| {
            Ok(SubmitOutcome::<()>::NotHandled)
        })
        .unwrap();
    let out = html(out);
    assert!(out.contains("readonly"));
    assert!(out.contains("value=\"Peter\""));
    assert!(out.contains("<a href='https://x.org' target='_blank'> https://x.org </a>"));
}

#[test]
fn test_get_does_not_submit() {
    let forms = forms();
    let mut request = get("index");
    let out = forms
        .submit_form(&mut request, &RenderOptions::default(), |_, _| {
            Ok(SubmitOutcome::Done("unexpected"))
        })
        .unwrap();
    assert!(out.html().is_some());
    assert!(request.messages().is_empty());
}

#[test]
fn test_oversized_upload_is_rejected() {
    let settings = Settings {
        max_upload_size: 4,
        ..Settings::default()
    };
    let forms = forms_with(settings);
    let mut request = FormRequest::builder()
        .method(http::Method::POST)
        .endpoint("index")
        .file("avatar", UploadedFile::new("me.jpg", "image/jpeg", b"abcdef".to_vec()))
        .build();
    assert!(matches!(
        forms.render_mdform::<()>(&mut request, None, None, &RenderOptions::default()),
        Err(MdFormError::BadRequest(_))
    ));
}

// ============================================================================
// 4. Pages and template context
// ============================================================================

#[test]
fn test_reserved_context_keys() {
    let forms = forms();
    for key in ["form", "meta"] {
        let mut request = get("index");
        let options = RenderOptions::default().with_context(key, 1);
        assert!(matches!(
            forms.render_mdform::<()>(&mut request, None, None, &options),
            Err(MdFormError::ReservedContextKey(k)) if k == key
        ));
    }
}

#[test]
fn test_page_rendering_and_context_merge() {
    let mut settings = Settings::default();
    settings.tmpl_context.insert("owner".into(), json!("configured"));
    settings.tmpl_context.insert("site".into(), json!("mdform"));
    let forms = forms_with(settings);

    let out = forms
        .get_page(&get("about"), &RenderOptions::default(), |_| {
            let mut ctx = Map::new();
            ctx.insert("owner".to_string(), Value::String("handler".into()));
            Ok(ctx)
        })
        .unwrap();
    assert_eq!(out, "<main><h1>About</h1><p>handler / mdform</p></main>");
}

#[test]
fn test_page_with_fields_is_rejected() {
    let forms = forms();
    assert!(matches!(
        forms.render_mdpage(&get("index"), &RenderOptions::default()),
        Err(MdFormError::PageContainsForm(name)) if name == "index"
    ));
}

#[test]
fn test_custom_formatter_per_call() {
    let forms = forms();
    let mut request = get("index");
    let options = RenderOptions::default().formatter(Arc::new(PlainFormatter));
    let out = html(forms.render_mdform::<()>(&mut request, None, None, &options).unwrap());
    assert_eq!(out, RENDERED_INDEX.trim_start());
}

#[test]
fn test_formatters_from_one_factory_are_cached_apart() {
    let make = |tag: &'static str| -> Arc<dyn Formatter> {
        Arc::new(FnFormatter::new(tag, move |name: &str, _: &FieldDescriptor| {
            format!("{tag}:{name}")
        }))
    };
    let forms = forms();

    let mut request = get("index");
    let first = RenderOptions::default().formatter(make("AAA"));
    let out = html(forms.render_mdform::<()>(&mut request, None, None, &first).unwrap());
    assert!(out.contains("AAA:name"));

    let second = RenderOptions::default().formatter(make("BBB"));
    let out = html(forms.render_mdform::<()>(&mut request, None, None, &second).unwrap());
    assert!(out.contains("BBB:name"));
    assert!(!out.contains("AAA"));
    assert_eq!(forms.cache().len(), 2);
}

#[test]
fn test_sources_from_template_dirs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("md/forms")).unwrap();
    std::fs::write(dir.path().join("md/forms/index.md"), index_source()).unwrap();
    std::fs::write(dir.path().join("form.html"), "<form>{% block innerform %}{% endblock %}</form>").unwrap();

    let settings = Settings {
        template_dirs: vec![dir.path().to_path_buf()],
        ..Settings::default()
    };
    let forms = MdForms::new(settings, JsonSourceParser);
    let mut request = get("forms.index");
    let out = html(
        forms
            .render_mdform::<()>(&mut request, None, None, &RenderOptions::default())
            .unwrap(),
    );
    assert!(out.starts_with("<form><p>Welcome to the form tester</p>"));
    assert!(out.ends_with("</p></form>"));
}
