//! DOM + canvas implementation of [`EnvelopeView`].
//!
//! Missing page elements are created on attach (with a small injected
//! stylesheet), so the widget works on a blank page as well as on a page that
//! ships its own markup and CSS for the same ids.
use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, Window};

use crate::config::LuckyConfig;
use crate::controller::EnvelopeView;
use crate::particles::Particle;
use crate::session::EnvelopeState;

pub(crate) const CANVAS_ID: &str = "confetti";
pub(crate) const CONTAINER_ID: &str = "envelopes";
pub(crate) const RESET_ID: &str = "resetBtn";
pub(crate) const RESULT_ID: &str = "resultBox";
pub(crate) const MODAL_ID: &str = "resultModal";
const STYLE_ID: &str = "lucky-envelopes-style";

const ENVELOPE_MARKUP: &str = "<div class=\"card\">\
<div class=\"front\"><div class=\"heart\">❤</div><div class=\"label\"></div></div>\
<div class=\"back\"><div class=\"amount\">?</div></div>\
</div>";

const STYLESHEET: &str = "
#confetti { position:fixed; inset:0; width:100%; height:100%; pointer-events:none; z-index:60; }
#envelopes { display:flex; flex-wrap:wrap; gap:18px; justify-content:center; padding:24px; }
.envelope { width:110px; height:150px; cursor:pointer; perspective:600px; }
.envelope .card { position:relative; width:100%; height:100%; transition:transform .6s; transform-style:preserve-3d; }
.envelope .front, .envelope .back { position:absolute; inset:0; border-radius:12px; backface-visibility:hidden;
  display:flex; flex-direction:column; align-items:center; justify-content:center; box-shadow:0 6px 18px rgba(0,0,0,.25); }
.envelope .front { background:#d32f2f; color:#ffd54f; font-family:serif; }
.envelope .front .heart { font-size:34px; }
.envelope .back { background:var(--face, #ffebee); color:#b71c1c; transform:rotateY(180deg); font-weight:bold; font-size:22px; }
.envelope.shaking { animation:lucky-shake .7s ease-in-out; }
.envelope.opened .card { transform:rotateY(180deg); }
.envelope.disabled { opacity:.45; cursor:not-allowed; pointer-events:none; }
@keyframes lucky-shake { 0%,100% { transform:rotate(0) } 20%,60% { transform:rotate(-6deg) } 40%,80% { transform:rotate(6deg) } }
#resultModal { position:fixed; inset:0; display:none; align-items:center; justify-content:center; background:rgba(0,0,0,.45); z-index:50; }
#resultModal.visible { display:flex; }
#resultBox { background:#fff8e1; color:#b71c1c; padding:24px 32px; border-radius:14px; font-size:20px; text-align:center; }
#resetBtn { display:none; margin:12px auto; padding:8px 18px; border-radius:8px; border:none; background:#d32f2f; color:#fff; font-size:16px; cursor:pointer; }
#resetBtn.visible { display:block; }
body.no-scroll { overflow:hidden; }
";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn state_class(state: EnvelopeState) -> Option<&'static str> {
    match state {
        EnvelopeState::Closed => None,
        EnvelopeState::Shaking => Some("shaking"),
        EnvelopeState::Opened => Some("opened"),
        EnvelopeState::Disabled => Some("disabled"),
    }
}

fn warn_on_err(result: Result<(), JsValue>, what: &str) {
    if let Err(err) = result {
        log::warn!("{} failed: {:?}", what, err);
    }
}

fn ensure_stylesheet(doc: &Document) -> Result<(), JsValue> {
    if doc.get_element_by_id(STYLE_ID).is_some() {
        return Ok(());
    }
    let style = doc.create_element("style")?;
    style.set_id(STYLE_ID);
    style.set_text_content(Some(STYLESHEET));
    let head = doc
        .head()
        .map(Element::from)
        .or_else(|| doc.body().map(Element::from))
        .ok_or_else(|| JsValue::from_str("no head or body"))?;
    head.append_child(&style)?;
    Ok(())
}

/// Element with `id`, created as a `tag` child of `parent` when absent.
fn ensure_element(doc: &Document, parent: &Element, id: &str, tag: &str) -> Result<Element, JsValue> {
    if let Some(el) = doc.get_element_by_id(id) {
        return Ok(el);
    }
    let el = doc.create_element(tag)?;
    el.set_id(id);
    parent.append_child(&el)?;
    Ok(el)
}

pub(crate) fn envelope_container(doc: &Document) -> Result<Element, JsValue> {
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
    ensure_element(doc, &body, CONTAINER_ID, "div")
}

pub struct DomView {
    window: Window,
    document: Document,
    container: Element,
    reset_button: Element,
    result_box: Element,
    modal: Element,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    css_size: (f64, f64),
    label: String,
    face_palette: Vec<String>,
}

impl DomView {
    pub fn attach(win: &Window, doc: &Document, config: &LuckyConfig) -> Result<Self, JsValue> {
        ensure_stylesheet(doc)?;
        let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;

        let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
            el.dyn_into()?
        } else {
            let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
            c.set_id(CANVAS_ID);
            c.set_attribute("aria-hidden", "true")?;
            body.append_child(&c)?;
            c
        };
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into()?;

        let container = envelope_container(doc)?;
        let reset_button = ensure_element(doc, &body, RESET_ID, "button")?;
        if reset_button.text_content().unwrap_or_default().trim().is_empty() {
            reset_button.set_text_content(Some(&config.texts.reset));
        }
        let modal = ensure_element(doc, &body, MODAL_ID, "div")?;
        modal.set_attribute("role", "dialog")?;
        modal.set_attribute("aria-modal", "true")?;
        let result_box = ensure_element(doc, &modal, RESULT_ID, "div")?;
        result_box.set_attribute("aria-live", "polite")?;

        let face_palette = (0..config.face_palette.len().max(1))
            .map(|i| config.face_color(i).to_string())
            .collect();

        let mut view = DomView {
            window: win.clone(),
            document: doc.clone(),
            container,
            reset_button,
            result_box,
            modal,
            canvas,
            ctx,
            css_size: (0.0, 0.0),
            label: config.texts.envelope_label.clone(),
            face_palette,
        };
        view.resize_surface();
        Ok(view)
    }

    /// Match the canvas to the viewport, scaled for device pixel density.
    pub fn resize_surface(&mut self) {
        let dpr = self.window.device_pixel_ratio();
        let dpr = if dpr > 0.0 { dpr } else { 1.0 };
        let w = self.window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let h = self.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        self.canvas.set_width((w * dpr) as u32);
        self.canvas.set_height((h * dpr) as u32);
        self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
        self.css_size = (w, h);
    }

    fn envelope(&self, index: usize) -> Option<Element> {
        self.container.children().item(index as u32)
    }

    fn append_envelope(&self, index: usize) -> Result<(), JsValue> {
        let el = self.document.create_element("div")?;
        el.set_class_name("envelope");
        el.set_attribute("data-index", &index.to_string())?;
        el.set_attribute("role", "button")?;
        el.set_attribute("tabindex", "0")?;
        el.set_attribute("aria-label", &format!("{} {}", self.label, index + 1))?;
        let face = &self.face_palette[index % self.face_palette.len()];
        el.set_attribute("style", &format!("--face:{};", face))?;
        el.set_inner_html(ENVELOPE_MARKUP);
        if let Some(label) = el.query_selector(".label")? {
            label.set_text_content(Some(&self.label));
        }
        self.container.append_child(&el)?;
        Ok(())
    }

    fn set_body_scroll_locked(&self, locked: bool) {
        if let Some(body) = self.document.body() {
            warn_on_err(
                body.class_list().toggle_with_force("no-scroll", locked).map(|_| ()),
                "body class toggle",
            );
        }
    }
}

impl EnvelopeView for DomView {
    fn render_envelopes(&mut self, count: usize) {
        self.container.set_inner_html("");
        for i in 0..count {
            warn_on_err(self.append_envelope(i), "envelope render");
        }
    }

    fn set_envelope_state(&mut self, index: usize, state: EnvelopeState) {
        let Some(el) = self.envelope(index) else { return };
        let classes = el.class_list();
        warn_on_err(classes.remove_3("shaking", "opened", "disabled"), "class reset");
        if let Some(class) = state_class(state) {
            warn_on_err(classes.add_1(class), "class add");
        }
        let aria = if state == EnvelopeState::Disabled {
            el.set_attribute("aria-disabled", "true")
        } else {
            el.remove_attribute("aria-disabled")
        };
        warn_on_err(aria, "aria-disabled");
    }

    fn set_envelope_amount(&mut self, index: usize, text: &str) {
        let Some(el) = self.envelope(index) else { return };
        if let Ok(Some(amount)) = el.query_selector(".back .amount") {
            amount.set_text_content(Some(text));
        }
    }

    fn set_status(&mut self, text: &str) {
        self.result_box.set_text_content(Some(text));
    }

    fn show_result(&mut self, congrats: &str, received: &str, amount: &str) {
        self.result_box.set_inner_html(&format!(
            "<strong>{}</strong><br>{} <strong>{}</strong>",
            escape_html(congrats),
            escape_html(received),
            escape_html(amount)
        ));
    }

    fn set_modal_visible(&mut self, visible: bool) {
        warn_on_err(
            self.modal.class_list().toggle_with_force("visible", visible).map(|_| ()),
            "modal toggle",
        );
        warn_on_err(
            self.modal.set_attribute("aria-hidden", if visible { "false" } else { "true" }),
            "modal aria-hidden",
        );
        self.set_body_scroll_locked(visible);
    }

    fn set_reset_visible(&mut self, visible: bool) {
        warn_on_err(
            self.reset_button.class_list().toggle_with_force("visible", visible).map(|_| ()),
            "reset toggle",
        );
        warn_on_err(
            self.reset_button.set_attribute("aria-hidden", if visible { "false" } else { "true" }),
            "reset aria-hidden",
        );
    }

    fn surface_size(&self) -> (f64, f64) {
        self.css_size
    }

    fn request_frames(&mut self) {
        super::start_frame_loop();
    }

    fn draw_particles(&mut self, particles: &[Particle]) {
        let (w, h) = self.css_size;
        self.ctx.clear_rect(0.0, 0.0, w, h);
        for p in particles {
            self.ctx.begin_path();
            self.ctx.set_fill_style(&JsValue::from_str(&p.color));
            self.ctx.set_global_alpha(p.opacity());
            self.ctx.arc(p.x, p.y, p.size, 0.0, TAU).ok();
            self.ctx.fill();
        }
        self.ctx.set_global_alpha(1.0);
    }

    fn clear_surface(&mut self) {
        let (w, h) = self.css_size;
        self.ctx.clear_rect(0.0, 0.0, w, h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_is_escaped() {
        assert_eq!(escape_html("<b>\"5\" & 'x'</b>"), "&lt;b&gt;&quot;5&quot; &amp; &#39;x&#39;&lt;/b&gt;");
        assert_eq!(escape_html("500 K"), "500 K");
    }

    #[test]
    fn state_classes() {
        assert_eq!(state_class(EnvelopeState::Closed), None);
        assert_eq!(state_class(EnvelopeState::Shaking), Some("shaking"));
        assert_eq!(state_class(EnvelopeState::Opened), Some("opened"));
        assert_eq!(state_class(EnvelopeState::Disabled), Some("disabled"));
    }
}
