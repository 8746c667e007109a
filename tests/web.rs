// Browser tests; run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn boots_six_closed_envelopes() {
    lucky_envelopes::start_lucky_envelopes().unwrap();
    let doc = web_sys::window().unwrap().document().unwrap();
    let container = doc.get_element_by_id("envelopes").unwrap();
    assert_eq!(container.children().length(), 6);
    assert!(doc.get_element_by_id("confetti").is_some());
    assert!(doc.get_element_by_id("resultModal").is_some());
    assert!(doc.query_selector(".envelope.opened").unwrap().is_none());
}

#[wasm_bindgen_test]
fn reset_rerenders_envelopes() {
    lucky_envelopes::start_lucky_envelopes().unwrap();
    lucky_envelopes::reset_envelopes();
    let doc = web_sys::window().unwrap().document().unwrap();
    let container = doc.get_element_by_id("envelopes").unwrap();
    assert_eq!(container.children().length(), 6);
}

async fn sleep_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve: js_sys::Function, _reject: js_sys::Function| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

#[wasm_bindgen_test]
async fn clicking_an_envelope_reveals_and_locks_the_rest() {
    lucky_envelopes::start_lucky_envelopes().unwrap();
    let doc = web_sys::window().unwrap().document().unwrap();
    let second = doc
        .query_selector(".envelope[data-index=\"1\"]")
        .unwrap()
        .unwrap()
        .dyn_into::<web_sys::HtmlElement>()
        .unwrap();
    second.click();
    assert!(second.class_list().contains("shaking"));

    // past the 700 ms shake, before the gate settles
    sleep_ms(900).await;

    assert_eq!(doc.query_selector_all(".envelope.opened").unwrap().length(), 1);
    assert_eq!(doc.query_selector_all(".envelope.disabled").unwrap().length(), 5);
    assert!(second.class_list().contains("opened"));
    let modal = doc.get_element_by_id("resultModal").unwrap();
    assert_eq!(modal.get_attribute("aria-hidden").as_deref(), Some("false"));
    assert!(doc.body().unwrap().class_list().contains("no-scroll"));

    lucky_envelopes::reset_envelopes();
    assert!(doc.query_selector(".envelope.opened").unwrap().is_none());
}
