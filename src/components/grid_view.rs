use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{HtmlElement, TouchEvent};
use yew::prelude::*;

use crate::model::{GridAction, GridState, RoomCatalog};
use crate::state::bounds::{CELL_PX, GridBounds};
use crate::state::{Camera, InputEvent, TouchState};

use super::camera_controls::CameraControls;

const RECENTER_MS: f64 = 400.0;
/// Pointer travel (px) past which a press counts as a pan, not a click.
const CLICK_SLOP_PX: f64 = 4.0;

fn write_transform(surface: &HtmlElement, cam: &Camera) {
    let t = format!(
        "translate({:.3}px, {:.3}px) scale({:.4})",
        cam.offset_x, cam.offset_y, cam.zoom
    );
    let _ = surface.style().set_property("transform", &t);
}

fn touch_distance(a: &web_sys::Touch, b: &web_sys::Touch) -> f64 {
    let dx = (a.client_x() - b.client_x()) as f64;
    let dy = (a.client_y() - b.client_y()) as f64;
    (dx * dx + dy * dy).sqrt()
}

#[derive(Properties, PartialEq, Clone)]
pub struct GridViewProps {
    pub catalog: Rc<RoomCatalog>,
}

#[function_component(GridView)]
pub fn grid_view(props: &GridViewProps) -> Html {
    let container_ref = use_node_ref();
    let surface_ref = use_node_ref();
    let camera = use_mut_ref(Camera::default);
    let touch_state = use_mut_ref(TouchState::default);
    // Set while a drag travels beyond the click slop; the cell click handler
    // checks it so releasing a pan never places a room.
    let suppress_click = use_mut_ref(|| false);
    let press_origin = use_mut_ref(|| (0.0_f64, 0.0_f64));
    let grid = use_reducer({
        let catalog = props.catalog.clone();
        move || GridState::new(catalog)
    });

    // Effect: after every grid mutation, fold the new bounds into the
    // camera (offset compensation) and recenter on the active room. The
    // first pass snaps, later ones animate.
    {
        let handle = grid.clone();
        let camera = camera.clone();
        let surface_ref = surface_ref.clone();
        let container_ref = container_ref.clone();
        let version = grid.version;
        use_effect_with(version, move |_| {
            let coords = handle.frame_coords();
            if let Some(bounds) = GridBounds::compute(&coords) {
                let mut cam = camera.borrow_mut();
                let first = !cam.initialized;
                cam.apply_bounds(bounds);
                if let (Some(active), Some(container)) =
                    (handle.active, container_ref.cast::<HtmlElement>())
                {
                    let vw = container.client_width() as f64;
                    let vh = container.client_height() as f64;
                    cam.recenter(active, vw, vh, first, RECENTER_MS);
                }
                cam.initialized = true;
                if let Some(surface) = surface_ref.cast::<HtmlElement>() {
                    write_transform(&surface, &cam);
                }
            }
            || ()
        });
    }

    // Main mount effect: raw event listeners + the frame loop driving the
    // recenter animation.
    {
        let container_ref = container_ref.clone();
        let surface_ref_setup = surface_ref.clone();
        let camera = camera.clone();
        let touch_state = touch_state.clone();
        let suppress_click = suppress_click.clone();
        let press_origin = press_origin.clone();
        use_effect_with((), move |_| {
            let window = web_sys::window().expect("window");
            let container: HtmlElement =
                container_ref.cast::<HtmlElement>().expect("grid container");

            // Frame loop
            let raf_id = Rc::new(RefCell::new(None));
            {
                let raf_id_clone = raf_id.clone();
                let window_loop = window.clone();
                let camera_loop = camera.clone();
                let surface_loop = surface_ref_setup.clone();
                let last_ts: Rc<RefCell<Option<f64>>> = Rc::new(RefCell::new(None));
                let closure_cell: Rc<RefCell<Option<Closure<dyn FnMut()>>>> =
                    Rc::new(RefCell::new(None));
                let closure_cell_clone = closure_cell.clone();
                *closure_cell.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                    let now = window_loop
                        .performance()
                        .map(|p| p.now())
                        .unwrap_or_default();
                    let dt = last_ts.borrow().map(|t| now - t).unwrap_or(0.0);
                    *last_ts.borrow_mut() = Some(now);
                    {
                        let mut cam = camera_loop.borrow_mut();
                        if cam.advance_anim(dt) {
                            if let Some(surface) = surface_loop.cast::<HtmlElement>() {
                                write_transform(&surface, &cam);
                            }
                        }
                    }
                    if let Ok(id) = window_loop.request_animation_frame(
                        closure_cell_clone
                            .borrow()
                            .as_ref()
                            .unwrap()
                            .as_ref()
                            .unchecked_ref(),
                    ) {
                        *raf_id_clone.borrow_mut() = Some(id);
                    }
                })
                    as Box<dyn FnMut()>));
                if let Ok(id) = window.request_animation_frame(
                    closure_cell
                        .borrow()
                        .as_ref()
                        .unwrap()
                        .as_ref()
                        .unchecked_ref(),
                ) {
                    *raf_id.borrow_mut() = Some(id);
                }
            }

            // Wheel zoom anchored at the cursor
            let wheel_cb = {
                let camera = camera.clone();
                let container = container.clone();
                let surface_ref = surface_ref_setup.clone();
                Closure::wrap(Box::new(move |e: web_sys::WheelEvent| {
                    e.prevent_default();
                    let rect = container.get_bounding_client_rect();
                    let x = e.client_x() as f64 - rect.left();
                    let y = e.client_y() as f64 - rect.top();
                    let mut cam = camera.borrow_mut();
                    cam.apply(InputEvent::WheelScroll {
                        x,
                        y,
                        delta_y: e.delta_y(),
                    });
                    if let Some(surface) = surface_ref.cast::<HtmlElement>() {
                        write_transform(&surface, &cam);
                    }
                }) as Box<dyn FnMut(_)>)
            };
            container
                .add_event_listener_with_callback("wheel", wheel_cb.as_ref().unchecked_ref())
                .unwrap();

            // Mouse pan
            let mousedown_cb = {
                let camera = camera.clone();
                let suppress_click = suppress_click.clone();
                let press_origin = press_origin.clone();
                Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
                    if e.button() != 0 {
                        return;
                    }
                    let x = e.client_x() as f64;
                    let y = e.client_y() as f64;
                    *suppress_click.borrow_mut() = false;
                    *press_origin.borrow_mut() = (x, y);
                    camera.borrow_mut().apply(InputEvent::DragStart { x, y });
                }) as Box<dyn FnMut(_)>)
            };
            container
                .add_event_listener_with_callback(
                    "mousedown",
                    mousedown_cb.as_ref().unchecked_ref(),
                )
                .unwrap();
            let mousemove_cb = {
                let camera = camera.clone();
                let suppress_click = suppress_click.clone();
                let press_origin = press_origin.clone();
                let surface_ref = surface_ref_setup.clone();
                Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
                    let mut cam = camera.borrow_mut();
                    if !cam.panning {
                        return;
                    }
                    let x = e.client_x() as f64;
                    let y = e.client_y() as f64;
                    let (ox, oy) = *press_origin.borrow();
                    if (x - ox).abs() + (y - oy).abs() > CLICK_SLOP_PX {
                        *suppress_click.borrow_mut() = true;
                    }
                    cam.apply(InputEvent::DragMove { x, y });
                    if let Some(surface) = surface_ref.cast::<HtmlElement>() {
                        write_transform(&surface, &cam);
                    }
                }) as Box<dyn FnMut(_)>)
            };
            container
                .add_event_listener_with_callback(
                    "mousemove",
                    mousemove_cb.as_ref().unchecked_ref(),
                )
                .unwrap();
            let mouseup_cb = {
                let camera = camera.clone();
                Closure::wrap(Box::new(move |_e: web_sys::MouseEvent| {
                    camera.borrow_mut().apply(InputEvent::DragEnd);
                }) as Box<dyn FnMut(_)>)
            };
            window
                .add_event_listener_with_callback("mouseup", mouseup_cb.as_ref().unchecked_ref())
                .unwrap();

            // Touch: one finger drags, two fingers pinch
            let touch_start_cb = {
                let camera = camera.clone();
                let touch_state = touch_state.clone();
                let suppress_click = suppress_click.clone();
                let press_origin = press_origin.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let touches = e.touches();
                    if touches.length() == 1 {
                        if let Some(t0) = touches.item(0) {
                            let x = t0.client_x() as f64;
                            let y = t0.client_y() as f64;
                            let mut ts = touch_state.borrow_mut();
                            ts.single_active = true;
                            ts.pinch = false;
                            *suppress_click.borrow_mut() = false;
                            *press_origin.borrow_mut() = (x, y);
                            camera.borrow_mut().apply(InputEvent::DragStart { x, y });
                        }
                    } else if touches.length() == 2 {
                        if let (Some(t0), Some(t1)) = (touches.item(0), touches.item(1)) {
                            let mut ts = touch_state.borrow_mut();
                            ts.single_active = false;
                            ts.pinch = true;
                            ts.last_pinch_dist = touch_distance(&t0, &t1);
                            *suppress_click.borrow_mut() = true;
                            camera.borrow_mut().apply(InputEvent::DragEnd);
                        }
                    }
                }) as Box<dyn FnMut(_)>)
            };
            container
                .add_event_listener_with_callback(
                    "touchstart",
                    touch_start_cb.as_ref().unchecked_ref(),
                )
                .ok();
            let touch_move_cb = {
                let camera = camera.clone();
                let touch_state = touch_state.clone();
                let suppress_click = suppress_click.clone();
                let press_origin = press_origin.clone();
                let container = container.clone();
                let surface_ref = surface_ref_setup.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let touches = e.touches();
                    if touches.length() == 1 {
                        if let Some(t0) = touches.item(0) {
                            let ts = touch_state.borrow();
                            if ts.single_active {
                                let x = t0.client_x() as f64;
                                let y = t0.client_y() as f64;
                                let (ox, oy) = *press_origin.borrow();
                                if (x - ox).abs() + (y - oy).abs() > CLICK_SLOP_PX {
                                    *suppress_click.borrow_mut() = true;
                                }
                                let mut cam = camera.borrow_mut();
                                cam.apply(InputEvent::DragMove { x, y });
                                if let Some(surface) = surface_ref.cast::<HtmlElement>() {
                                    write_transform(&surface, &cam);
                                }
                            }
                        }
                    } else if touches.length() == 2 {
                        if let (Some(t0), Some(t1)) = (touches.item(0), touches.item(1)) {
                            let mut ts = touch_state.borrow_mut();
                            if ts.pinch {
                                let dist = touch_distance(&t0, &t1);
                                if ts.last_pinch_dist > 0.0 {
                                    let rect = container.get_bounding_client_rect();
                                    let cx = (t0.client_x() + t1.client_x()) as f64 / 2.0
                                        - rect.left();
                                    let cy = (t0.client_y() + t1.client_y()) as f64 / 2.0
                                        - rect.top();
                                    let factor = dist / ts.last_pinch_dist;
                                    let mut cam = camera.borrow_mut();
                                    cam.apply(InputEvent::PinchUpdate { cx, cy, factor });
                                    if let Some(surface) = surface_ref.cast::<HtmlElement>() {
                                        write_transform(&surface, &cam);
                                    }
                                }
                                ts.last_pinch_dist = dist;
                            }
                        }
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            container
                .add_event_listener_with_callback(
                    "touchmove",
                    touch_move_cb.as_ref().unchecked_ref(),
                )
                .ok();
            let touch_end_cb = {
                let camera = camera.clone();
                let touch_state = touch_state.clone();
                let suppress_click = suppress_click.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let touches = e.touches();
                    if touches.length() == 0 {
                        touch_state.borrow_mut().clear();
                        camera.borrow_mut().apply(InputEvent::DragEnd);
                        // A clean tap still needs its synthesized click.
                        if *suppress_click.borrow() {
                            e.prevent_default();
                        }
                    } else if touches.length() == 1 {
                        if let Some(t0) = touches.item(0) {
                            // Pinch finger lifted: continue as a drag.
                            let mut ts = touch_state.borrow_mut();
                            ts.pinch = false;
                            ts.single_active = true;
                            ts.last_pinch_dist = 0.0;
                            camera.borrow_mut().apply(InputEvent::DragStart {
                                x: t0.client_x() as f64,
                                y: t0.client_y() as f64,
                            });
                        }
                    }
                }) as Box<dyn FnMut(_)>)
            };
            container
                .add_event_listener_with_callback(
                    "touchend",
                    touch_end_cb.as_ref().unchecked_ref(),
                )
                .ok();
            container
                .add_event_listener_with_callback(
                    "touchcancel",
                    touch_end_cb.as_ref().unchecked_ref(),
                )
                .ok();

            // Cleanup
            let window_clone = window.clone();
            move || {
                let _ = container.remove_event_listener_with_callback(
                    "wheel",
                    wheel_cb.as_ref().unchecked_ref(),
                );
                let _ = container.remove_event_listener_with_callback(
                    "mousedown",
                    mousedown_cb.as_ref().unchecked_ref(),
                );
                let _ = container.remove_event_listener_with_callback(
                    "mousemove",
                    mousemove_cb.as_ref().unchecked_ref(),
                );
                let _ = window_clone.remove_event_listener_with_callback(
                    "mouseup",
                    mouseup_cb.as_ref().unchecked_ref(),
                );
                let _ = container.remove_event_listener_with_callback(
                    "touchstart",
                    touch_start_cb.as_ref().unchecked_ref(),
                );
                let _ = container.remove_event_listener_with_callback(
                    "touchmove",
                    touch_move_cb.as_ref().unchecked_ref(),
                );
                let _ = container.remove_event_listener_with_callback(
                    "touchend",
                    touch_end_cb.as_ref().unchecked_ref(),
                );
                let _ = container.remove_event_listener_with_callback(
                    "touchcancel",
                    touch_end_cb.as_ref().unchecked_ref(),
                );
                if let Some(id) = *raf_id.borrow() {
                    let _ = window_clone.cancel_animation_frame(id);
                }
                let _keep_alive = (
                    &wheel_cb,
                    &mousedown_cb,
                    &mousemove_cb,
                    &mouseup_cb,
                    &touch_start_cb,
                    &touch_move_cb,
                    &touch_end_cb,
                );
            }
        });
    }

    // Camera control callbacks
    let zoom_button = |factor: f64| {
        let camera = camera.clone();
        let container_ref = container_ref.clone();
        let surface_ref = surface_ref.clone();
        Callback::from(move |()| {
            if let (Some(container), Some(surface)) = (
                container_ref.cast::<HtmlElement>(),
                surface_ref.cast::<HtmlElement>(),
            ) {
                let cx = container.client_width() as f64 * 0.5;
                let cy = container.client_height() as f64 * 0.5;
                let mut cam = camera.borrow_mut();
                cam.anim = None;
                cam.zoom_at(cx, cy, factor);
                write_transform(&surface, &cam);
            }
        })
    };
    let on_center: Callback<()> = {
        let camera = camera.clone();
        let container_ref = container_ref.clone();
        let grid = grid.clone();
        Callback::from(move |()| {
            if let (Some(active), Some(container)) =
                (grid.active, container_ref.cast::<HtmlElement>())
            {
                let vw = container.client_width() as f64;
                let vh = container.client_height() as f64;
                camera
                    .borrow_mut()
                    .recenter(active, vw, vh, false, RECENTER_MS);
            }
        })
    };
    let on_reset: Callback<()> = {
        let grid = grid.clone();
        Callback::from(move |()| grid.dispatch(GridAction::Reset))
    };

    // Cell grid for the current bounds rectangle. Bounds come straight from
    // the grid state so the rendered cells and the camera compensation in
    // the version effect agree.
    let bounds = GridBounds::compute(&grid.frame_coords());
    let surface = match bounds {
        None => html! {},
        Some(b) => {
            let make_click = |x: i32, y: i32, occupied: bool, potential: bool| {
                let grid = grid.clone();
                let suppress_click = suppress_click.clone();
                Callback::from(move |_: MouseEvent| {
                    if *suppress_click.borrow() {
                        return;
                    }
                    if occupied {
                        grid.dispatch(GridAction::SetActive { x, y });
                    } else if potential {
                        grid.dispatch(GridAction::Place {
                            x,
                            y,
                            roll: js_sys::Math::random(),
                        });
                    }
                })
            };
            let mut cells: Vec<Html> = Vec::new();
            for y in (b.min_y..=b.max_y).rev() {
                for x in b.range_min_x..=b.range_max_x {
                    let (left, top) = b.cell_origin(x, y);
                    let placed = grid.placed_at(x, y);
                    let potential = grid.is_potential(x, y);
                    let active = grid.active == Some((x, y));
                    let mut style = format!(
                        "position:absolute; left:{left}px; top:{top}px; width:{CELL_PX}px; height:{CELL_PX}px; box-sizing:border-box;"
                    );
                    if placed.is_some() {
                        style.push_str(" background:#161b22; border:1px solid #2f3641;");
                        if active {
                            style.push_str(" outline:4px solid #58a6ff; outline-offset:-4px; z-index:1;");
                        }
                    } else if potential {
                        style.push_str(
                            " background:#1d2430; border:2px dashed #3a4455; cursor:pointer;",
                        );
                    } else {
                        style.push_str(" border:1px solid #12161d;");
                    }
                    let onclick = make_click(x, y, placed.is_some(), potential);
                    let content = match placed {
                        Some(p) => {
                            let room = &grid.catalog.rooms[p.room];
                            html! {
                                <img
                                    src={room.image.clone()}
                                    alt={room.name.clone()}
                                    title={room.name.clone()}
                                    draggable="false"
                                    style="width:100%; height:100%; display:block; pointer-events:none; user-select:none;"
                                />
                            }
                        }
                        None => html! {},
                    };
                    cells.push(html! {
                        <div key={format!("{x},{y}")} style={style} {onclick}>
                            { content }
                        </div>
                    });
                }
            }
            let cam = camera.borrow();
            let surface_style = format!(
                "position:absolute; left:0; top:0; width:{}px; height:{}px; transform-origin:0 0; transform:translate({:.3}px, {:.3}px) scale({:.4});",
                b.columns() as f64 * CELL_PX,
                b.rows() as f64 * CELL_PX,
                cam.offset_x,
                cam.offset_y,
                cam.zoom
            );
            html! {
                <div ref={surface_ref.clone()} style={surface_style}>
                    { for cells }
                </div>
            }
        }
    };

    html! {
        <div
            ref={container_ref.clone()}
            id="grid-viewport"
            style="position:relative; width:100vw; height:100vh; overflow:hidden; background:#0e1116; touch-action:none; cursor:grab;"
        >
            { surface }
            <CameraControls
                on_zoom_in={zoom_button(1.25)}
                on_zoom_out={zoom_button(0.8)}
                on_center={on_center}
                on_reset={on_reset}
            />
        </div>
    }
}
