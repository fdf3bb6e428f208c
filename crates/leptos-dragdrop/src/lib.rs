//! Leptos DragDrop Utilities
//!
//! Mouse-driven reordering for flat lists of rows.
//! Uses a movement threshold to distinguish click from drag.

use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Where a dragged row would land
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropTarget {
    /// Insert before the row with this id
    Before(u32),
    /// Append after the last row
    End,
}

/// DnD state signals for one list
#[derive(Clone, Copy)]
pub struct DndSignals {
    pub dragging_id: RwSignal<Option<u32>>,
    pub drop_target: RwSignal<Option<DropTarget>>,
    /// Set briefly after a drag so the trailing click can be ignored
    pub drag_just_ended: RwSignal<bool>,
    /// Row under a mousedown that has not moved far enough yet
    pending_id: RwSignal<Option<u32>>,
    start: RwSignal<(i32, i32)>,
}

/// Movement threshold in pixels to start dragging
const DRAG_THRESHOLD_PX: i32 = 5;

pub fn create_dnd_signals() -> DndSignals {
    DndSignals {
        dragging_id: RwSignal::new(None),
        drop_target: RwSignal::new(None),
        drag_just_ended: RwSignal::new(false),
        pending_id: RwSignal::new(None),
        start: RwSignal::new((0, 0)),
    }
}

impl DndSignals {
    pub fn is_dragging(&self, id: u32) -> bool {
        self.dragging_id.get() == Some(id)
    }

    pub fn is_target(&self, target: DropTarget) -> bool {
        self.drop_target.get() == Some(target)
    }
}

/// New ordering of `ids` after dropping `dragged` on `target`.
/// `None` when the drop changes nothing or `dragged` is not in the list.
pub fn reorder(ids: &[u32], dragged: u32, target: DropTarget) -> Option<Vec<u32>> {
    if !ids.contains(&dragged) {
        return None;
    }
    if target == DropTarget::Before(dragged) {
        return None;
    }
    let mut out: Vec<u32> = ids.iter().copied().filter(|id| *id != dragged).collect();
    let at = match target {
        DropTarget::Before(id) => out.iter().position(|x| *x == id)?,
        DropTarget::End => out.len(),
    };
    out.insert(at, dragged);
    (out != ids).then_some(out)
}

/// End drag operation
pub fn end_drag(dnd: &DndSignals) {
    let was_dragging = dnd.dragging_id.try_get_untracked().flatten().is_some();
    dnd.dragging_id.try_set(None);
    dnd.drop_target.try_set(None);
    dnd.pending_id.try_set(None);
    if !was_dragging {
        return;
    }
    dnd.drag_just_ended.try_set(true);

    if let Some(win) = web_sys::window() {
        let clear = dnd.drag_just_ended;
        let cb = Closure::<dyn FnMut()>::new(move || {
            clear.try_set(false);
        });
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 100);
        cb.forget();
    }
}

/// Mousedown on a draggable row: remember it and where the press started
pub fn make_on_mousedown(dnd: DndSignals, row_id: u32) -> impl Fn(web_sys::MouseEvent) + Copy + 'static {
    move |ev: web_sys::MouseEvent| {
        if ev.button() != 0 {
            return;
        }
        // Editing controls keep their own mouse handling
        if let Some(target) = ev.target() {
            if target.dyn_ref::<web_sys::HtmlInputElement>().is_some() { return; }
            if target.dyn_ref::<web_sys::HtmlButtonElement>().is_some() { return; }
        }
        dnd.pending_id.set(Some(row_id));
        dnd.start.set((ev.client_x(), ev.client_y()));
    }
}

/// Mouseenter on a row or on the trailing zone
pub fn make_on_mouseenter(dnd: DndSignals, target: DropTarget) -> impl Fn(web_sys::MouseEvent) + Copy + 'static {
    move |_ev: web_sys::MouseEvent| {
        if let Some(dragging) = dnd.dragging_id.get_untracked() {
            if target != DropTarget::Before(dragging) {
                dnd.drop_target.set(Some(target));
            }
        }
    }
}

pub fn make_on_mouseleave(dnd: DndSignals) -> impl Fn(web_sys::MouseEvent) + Copy + 'static {
    move |_ev: web_sys::MouseEvent| {
        if dnd.dragging_id.get_untracked().is_some() {
            dnd.drop_target.set(None);
        }
    }
}

fn bind_global_mousemove(dnd: DndSignals) {
    let on_mousemove = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: web_sys::MouseEvent| {
        // Signals are gone once the list unmounts
        let Some(pending) = dnd.pending_id.try_get_untracked().flatten() else { return };
        if dnd.dragging_id.try_get_untracked().flatten().is_some() {
            return;
        }
        let (x, y) = dnd.start.try_get_untracked().unwrap_or_default();
        if (ev.client_x() - x).abs() > DRAG_THRESHOLD_PX || (ev.client_y() - y).abs() > DRAG_THRESHOLD_PX {
            dnd.dragging_id.try_set(Some(pending));
        }
    });

    if let Some(doc) = web_sys::window().and_then(|w| w.document()) {
        let _ = doc.add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref());
    }
    on_mousemove.forget();
}

/// Bind document-level mouseup (drop detection) and mousemove (drag start)
pub fn bind_global_mouseup<F>(dnd: DndSignals, on_drop: F)
where
    F: Fn(u32, DropTarget) + 'static,
{
    let on_mouseup = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_ev: web_sys::MouseEvent| {
        let dragging = dnd.dragging_id.try_get_untracked().flatten();
        let target = dnd.drop_target.try_get_untracked().flatten();
        end_drag(&dnd);
        if let (Some(dragged), Some(target)) = (dragging, target) {
            on_drop(dragged, target);
        }
    });

    if let Some(doc) = web_sys::window().and_then(|w| w.document()) {
        let _ = doc.add_event_listener_with_callback("mouseup", on_mouseup.as_ref().unchecked_ref());
    }
    on_mouseup.forget();

    bind_global_mousemove(dnd);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_up() {
        assert_eq!(reorder(&[1, 2, 3, 4], 3, DropTarget::Before(1)), Some(vec![3, 1, 2, 4]));
    }

    #[test]
    fn test_move_down_and_to_end() {
        assert_eq!(reorder(&[1, 2, 3, 4], 1, DropTarget::Before(4)), Some(vec![2, 3, 1, 4]));
        assert_eq!(reorder(&[1, 2, 3], 1, DropTarget::End), Some(vec![2, 3, 1]));
    }

    #[test]
    fn test_noop_drops() {
        assert_eq!(reorder(&[1, 2, 3], 2, DropTarget::Before(2)), None);
        assert_eq!(reorder(&[1, 2, 3], 2, DropTarget::Before(3)), None);
        assert_eq!(reorder(&[1, 2, 3], 3, DropTarget::End), None);
        assert_eq!(reorder(&[1, 2, 3], 9, DropTarget::End), None);
        assert_eq!(reorder(&[1, 2, 3], 1, DropTarget::Before(9)), None);
    }
}
