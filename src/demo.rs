use anyhow::{Context, Result};
use capture::{ChangeNotification, InteractionDetail, InteractionNotification};
use dom_snapshot::{outer_html, DomTree, NodeId};
use exporter::{ExportPolicyView, TranscriptExporter};
use pagetrace_core_types::{Modifiers, NavigationKind};
use recorder::{RecorderSettings, SessionMeta};
use transcript_log::TranscriptLog;

use crate::build_recorder;

struct DemoPage {
    tree: DomTree,
    email: NodeId,
    password: NodeId,
    submit: NodeId,
    cart: NodeId,
    form: NodeId,
}

fn build_page() -> Result<DemoPage> {
    let mut tree = DomTree::with_root("html");
    let root = tree.root();
    let body = tree.append_element(root, "body")?;
    let form = tree.append_element(body, "form")?;
    tree.set_attr(form, "id", "contact-form")?;

    let email_label = tree.append_element(form, "label")?;
    tree.set_attr(email_label, "for", "email")?;
    tree.append_text(email_label, "Email")?;
    let email = tree.append_element(form, "input")?;
    tree.set_attr(email, "id", "email")?;
    tree.set_attr(email, "type", "email")?;

    let password = tree.append_element(form, "input")?;
    tree.set_attr(password, "id", "password")?;
    tree.set_attr(password, "type", "password")?;
    tree.set_attr(password, "aria-label", "Password")?;

    let submit = tree.append_element(form, "button")?;
    tree.set_attr(submit, "id", "submit-btn")?;
    tree.set_attr(submit, "aria-label", "Submit")?;

    let cart = tree.append_element(body, "ul")?;
    tree.set_attr(cart, "id", "cart")?;

    Ok(DemoPage {
        tree,
        email,
        password,
        submit,
        cart,
        form,
    })
}

fn typed(target: NodeId, input_type: &str, value: &str) -> InteractionNotification {
    InteractionNotification {
        target,
        detail: InteractionDetail::Input {
            input_type: input_type.into(),
            value: value.into(),
            selection: None,
        },
    }
}

/// Runs a scripted checkout session through the full pipeline and renders
/// the transcript. Deterministic apart from generated ids and wall stamps.
pub async fn run_demo() -> Result<String> {
    let (recorder, log, clock) = build_recorder(RecorderSettings::default());
    let mut page = build_page()?;

    let session = recorder
        .start(SessionMeta {
            title: "Checkout demo".into(),
            url: "https://shop.example/checkout".into(),
        })
        .await?;

    // Initial navigation, carrying the full page source.
    let source = outer_html(&page.tree, page.tree.root());
    recorder
        .observe_interaction(
            &page.tree,
            InteractionNotification {
                target: page.tree.root(),
                detail: InteractionDetail::Navigation {
                    url: "https://shop.example/checkout".into(),
                    kind: NavigationKind::Initial,
                    page_source: Some(source),
                },
            },
        )
        .await?;

    // A burst of keystrokes; only the final value survives the debounce.
    clock.set(100);
    recorder
        .observe_interaction(
            &page.tree,
            InteractionNotification {
                target: page.email,
                detail: InteractionDetail::Focus,
            },
        )
        .await?;
    for (at, value) in [(120, "u"), (180, "user@exa"), (240, "user@example.com")] {
        clock.set(at);
        recorder
            .observe_interaction(&page.tree, typed(page.email, "email", value))
            .await?;
    }
    clock.set(600);
    recorder.tick().await?;

    clock.set(700);
    recorder
        .observe_interaction(&page.tree, typed(page.password, "password", "hunter2"))
        .await?;
    clock.set(1_100);
    recorder.tick().await?;

    clock.set(1_200);
    recorder
        .observe_interaction(
            &page.tree,
            InteractionNotification {
                target: page.submit,
                detail: InteractionDetail::Click {
                    button: 0,
                    x: 320.0,
                    y: 410.0,
                    modifiers: Modifiers::default(),
                },
            },
        )
        .await?;

    // The page reacts: a toast lands in the cart list.
    clock.set(1_250);
    let toast = page.tree.append_element(page.cart, "li")?;
    page.tree.append_text(toast, "Order saved")?;
    recorder
        .observe_changes(
            &page.tree,
            vec![ChangeNotification::ChildList {
                target: page.cart,
                added: vec![toast],
                removed: vec![],
            }],
        )
        .await?;
    clock.set(1_350);
    recorder.tick().await?;

    clock.set(1_400);
    page.tree.set_attr(page.form, "class", "submitted")?;
    recorder
        .observe_changes(
            &page.tree,
            vec![ChangeNotification::Attribute {
                target: page.form,
                name: "class".into(),
                old_value: None,
            }],
        )
        .await?;

    clock.set(1_600);
    recorder.stop().await?;

    let stored = log
        .session(&session.id)
        .context("session missing from log")?;
    let events = log.query_ordered(&session.id).await?;
    Ok(TranscriptExporter::new(ExportPolicyView::default()).export(&stored, &events))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_transcript_is_complete_and_redacted() {
        let doc = run_demo().await.expect("demo runs");
        assert!(doc.contains("# Session Recording: Checkout demo"));
        assert!(doc.contains("## Initial Page Source"));
        assert!(doc.contains("Value: `[EMAIL]` (redacted)"));
        assert!(doc.contains("Value: `[PASSWORD]` (redacted)"));
        assert!(doc.contains("User clicked **\"Submit\"** (`#submit-btn`)"));
        assert!(doc.contains("1 element added to `#cart`"));
        assert!(doc.contains("| Redactions Applied | 2 |"));
        assert!(!doc.contains("hunter2"));
        assert!(!doc.contains("user@example.com"));
    }
}
