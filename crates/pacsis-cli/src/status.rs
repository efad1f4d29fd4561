//! Text rendering of the session for the terminal.

use std::fmt::Write;

use pacsis_core::PeripheralKind;
use pacsis_panel::{Button, Session, door_button, input_button};
use pacsis_topology::DeviceTree;

/// Doors with every peripheral's state and the derived buttons.
pub fn render(session: &Session) -> String {
    let mut out = format!(
        "controller: {} ({}) [{}]\n",
        session.connection().config().ws_url(),
        session.connection_state(),
        session.connection_button()
    );
    render_tree(&mut out, session.tree());

    let alerts = session.alerts().len();
    if alerts > 0 {
        let _ = writeln!(out, "{alerts} alert(s), 'alerts' to list");
    }
    out
}

fn render_tree(out: &mut String, tree: &DeviceTree) {
    if tree.is_empty() {
        out.push_str("no doors configured\n");
        return;
    }

    for door in tree.doors() {
        let _ = writeln!(out, "door {} {}", door.id(), bracket(&door_button(door)));
        for kind in PeripheralKind::ALL {
            for peripheral in door.peripherals(kind) {
                let (id, state) = (peripheral.id(), peripheral.state());
                let _ = write!(out, "  {kind:<13} {id:<12} {state}");
                if kind == PeripheralKind::DigitalInput {
                    let _ = write!(out, " {}", bracket(&input_button(door, peripheral)));
                }
                out.push('\n');
            }
        }
    }

    if !tree.is_fully_known() {
        let unknown = tree.unknown_count();
        let _ = writeln!(out, "{unknown} peripheral(s) not yet reported");
    }
}

fn bracket(button: &Button) -> String {
    if button.is_blank() {
        String::new()
    } else {
        format!("[{button}]")
    }
}
