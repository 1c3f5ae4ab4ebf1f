use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, specta::Type)]
/// One line of the itemized order list
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, specta::Type)]
/// Read-only order summary pushed by the tracking feed. Display strings are
/// formatted upstream; this core never parses or recomputes them.
pub struct OrderSnapshot {
    pub order_id: Uuid,
    pub eta: String,
    pub distance: String,
    pub pharmacy_name: String,
    pub total_amount: String,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, specta::Type)]
/// Expand/collapse state of the order summary panel, mutated only by taps
pub struct PanelUiState {
    pub expanded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, specta::Type)]
/// Display-ready panel contents, re-read by the host after a state update
pub struct PanelView {
    pub eta: String,
    pub distance: String,
    pub pharmacy_name: String,
    pub total_amount: String,
    pub expanded: bool,
    /// Present only while the panel is expanded; may be empty
    pub items: Option<Vec<OrderItem>>,
}

/// Holds the latest order snapshot and the panel's expand/collapse state,
/// and derives [PanelView]s from them. Purely reactive, no timers or I/O.
#[derive(Default)]
pub struct TrackingPanelController {
    ui: PanelUiState,
    snapshot: Option<OrderSnapshot>,
}

impl TrackingPanelController {
    pub fn on_order_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.snapshot = Some(snapshot);
    }

    /// Flip the expanded state; pure transition, no other effects
    pub fn toggle_expanded(&mut self) {
        self.ui.expanded = !self.ui.expanded;
    }

    pub fn expanded(&self) -> bool {
        self.ui.expanded
    }

    /// Derive the current view, or `None` if no snapshot has arrived yet
    pub fn as_view(&self) -> Option<PanelView> {
        let snapshot = self.snapshot.as_ref()?;
        Some(PanelView {
            eta: snapshot.eta.clone(),
            distance: snapshot.distance.clone(),
            pharmacy_name: snapshot.pharmacy_name.clone(),
            total_amount: snapshot.total_amount.clone(),
            expanded: self.ui.expanded,
            items: self.ui.expanded.then(|| snapshot.items.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(items: Vec<OrderItem>) -> OrderSnapshot {
        OrderSnapshot {
            order_id: Uuid::new_v4(),
            eta: "12 min".into(),
            distance: "3.4 km".into(),
            pharmacy_name: "Greenleaf Pharmacy".into(),
            total_amount: "$24.50".into(),
            items,
        }
    }

    fn item() -> OrderItem {
        OrderItem {
            name: "Paracetamol 500mg".into(),
            quantity: 2,
            price: "$4.00".into(),
        }
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut panel = TrackingPanelController::default();
        assert!(!panel.expanded());
        panel.toggle_expanded();
        assert!(panel.expanded());
        panel.toggle_expanded();
        assert!(!panel.expanded());
    }

    #[test]
    fn test_view_without_snapshot() {
        let panel = TrackingPanelController::default();
        assert!(panel.as_view().is_none());
    }

    #[test]
    fn test_items_only_when_expanded() {
        let mut panel = TrackingPanelController::default();
        panel.on_order_snapshot(snapshot(vec![item()]));

        let collapsed = panel.as_view().unwrap();
        assert_eq!(collapsed.eta, "12 min");
        assert_eq!(collapsed.pharmacy_name, "Greenleaf Pharmacy");
        assert_eq!(collapsed.total_amount, "$24.50");
        assert!(collapsed.items.is_none());

        panel.toggle_expanded();
        let expanded = panel.as_view().unwrap();
        assert_eq!(expanded.items.as_deref(), Some(&[item()][..]));
    }

    #[test]
    fn test_expanded_with_no_items_renders_empty_list() {
        let mut panel = TrackingPanelController::default();
        panel.on_order_snapshot(snapshot(vec![]));
        panel.toggle_expanded();

        let view = panel.as_view().unwrap();
        assert_eq!(view.items.as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_newer_snapshot_replaces_older() {
        let mut panel = TrackingPanelController::default();
        panel.on_order_snapshot(snapshot(vec![]));
        let mut newer = snapshot(vec![]);
        newer.eta = "4 min".into();
        panel.on_order_snapshot(newer);

        assert_eq!(panel.as_view().unwrap().eta, "4 min");
    }
}
