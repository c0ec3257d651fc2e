use std::rc::Rc;
use gloo_net::http::Request;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::grid_view::GridView;
use crate::model::RoomCatalog;
use crate::util::clog;

/// Root component: fetches the room catalog once on mount, then hands it to
/// the grid view. Until it arrives (or if it fails) only the empty shell
/// renders.
#[function_component(App)]
pub fn app() -> Html {
    let catalog = use_state(|| None::<Rc<RoomCatalog>>);

    {
        let catalog = catalog.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let text = match Request::get("rooms.json").send().await {
                    Ok(resp) => match resp.text().await {
                        Ok(t) => t,
                        Err(e) => {
                            clog(&format!("rooms.json body read failed: {e}"));
                            return;
                        }
                    },
                    Err(e) => {
                        clog(&format!("rooms.json fetch failed: {e}"));
                        return;
                    }
                };
                match serde_json::from_str::<RoomCatalog>(&text) {
                    Ok(cat) if cat.rooms.is_empty() => {
                        clog("rooms.json contains no rooms");
                    }
                    Ok(cat) => catalog.set(Some(Rc::new(cat))),
                    Err(e) => clog(&format!("rooms.json parse failed: {e}")),
                }
            });
            || ()
        });
    }

    html! {
        <div id="root">
            {
                match &*catalog {
                    Some(cat) => html! { <GridView catalog={cat.clone()} /> },
                    None => html! {
                        <div style="width:100vw; height:100vh; background:#0e1116;"></div>
                    },
                }
            }
        </div>
    }
}
