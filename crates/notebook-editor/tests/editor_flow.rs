//! Editor-level behavior tests.
//!
//! The gateway base points at the discard port, so any accidental HTTP
//! request fails loudly; the assertions below depend on the editor *not*
//! reaching the network.

use gateway_client::{ChannelState, GatewayClient, Kernel, Session};
use notebook_editor::{EditorError, NotebookEditor};

fn editor() -> NotebookEditor {
    let _ = env_logger::builder().is_test(true).try_init();
    let client = GatewayClient::from_base("http://127.0.0.1:9").unwrap();
    NotebookEditor::new(client, "demo.ipynb").with_username("tester")
}

fn session() -> Session {
    Session {
        id: "s-1".to_string(),
        kernel: Kernel {
            id: "k-1".to_string(),
            name: "python3".to_string(),
        },
    }
}

#[tokio::test]
async fn test_start_session_is_idempotent_by_presence() {
    let mut editor = editor();
    editor.resume_session(session());

    // A second start must not issue a creation request; with the base URL
    // unroutable, any request would surface as a gateway error.
    let held = editor.start_session("demo.ipynb", "notebook").await.unwrap();
    assert_eq!(held.id, "s-1");
    assert_eq!(editor.session().unwrap().id, "s-1");
    assert_eq!(editor.session().unwrap().kernel.id, "k-1");
}

#[tokio::test]
async fn test_start_session_requires_a_kernel() {
    let mut editor = editor();
    let err = editor
        .start_session("demo.ipynb", "notebook")
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::NoKernel));
}

#[test]
fn test_submit_requires_a_session() {
    let mut editor = editor();
    editor.add_cell_below(0);
    let err = editor.submit_cell(0).unwrap_err();
    assert!(matches!(err, EditorError::NoSession));
}

#[tokio::test]
async fn test_submit_with_channel_not_open_fails_fast() {
    let mut editor = editor();
    editor.resume_session(session());
    editor.add_cell_below(0);
    editor.edit_cell(0, "1 + 1").unwrap();

    assert_eq!(editor.channel_state(), ChannelState::Disconnected);
    let err = editor.submit_cell(0).unwrap_err();
    assert!(matches!(err, EditorError::Channel(_)));
}

#[test]
fn test_cell_operations_and_focus() {
    let mut editor = editor();
    assert!(editor.notebook().is_empty());

    editor.add_cell_below(0);
    editor.add_cell_below(0);
    editor.add_cell_above(0);
    assert_eq!(editor.notebook().len(), 3);
    assert_eq!(editor.focused(), 0);

    editor.edit_cell(1, "x = 1").unwrap();
    assert_eq!(editor.focus_next(), 1);
    assert_eq!(editor.focus_next(), 2);
    assert_eq!(editor.focus_next(), 2); // no wraparound
    assert_eq!(editor.focus_previous(), 1);

    editor.delete_cell(2).unwrap();
    assert_eq!(editor.notebook().len(), 2);
    let err = editor.delete_cell(5).unwrap_err();
    assert!(matches!(err, EditorError::Document(_)));
    assert_eq!(editor.notebook().len(), 2);

    editor.record_execution(1, 1).unwrap();
    assert_eq!(editor.notebook().cells[1].execution_count, 1);
}

#[test]
fn test_rendered_output_for_blank_cell_is_none() {
    let mut editor = editor();
    editor.add_cell_below(0);
    assert!(editor.rendered_output(0).unwrap().is_none());
    assert!(editor.rendered_output(7).is_err());
}
