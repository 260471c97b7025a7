//! `Text` and `Title` components.

use super::{Anchor, css, parse_options};
use crate::Result;
use crate::item::{ComponentState, Item, Positioned, RenderContext};
use crate::svg::apply_transform;
use serde::Deserialize;
use serde_json::{Map, Value};
use tessera_core::geom::{fmt_number, rotate, translate};
use tessera_core::{ItemConfig, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl TextAlign {
    pub fn anchor(self) -> Anchor {
        match self {
            TextAlign::Left => Anchor::Start,
            TextAlign::Center => Anchor::Middle,
            TextAlign::Right => Anchor::End,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOptions {
    pub text: Option<String>,
    pub rotation: Option<f64>,
    pub text_align: TextAlign,
    /// Derived from `text_align` when unset.
    pub anchor: Option<Anchor>,
    pub vertical_align: VerticalAlign,
    pub class: Option<String>,
    pub style: Option<Map<String, Value>>,
    pub font_size: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Text {
    state: ComponentState,
    options: TextOptions,
    title: bool,
}

pub fn create_text(config: &ItemConfig) -> Result<Box<dyn Item>> {
    Ok(Box::new(Text::new(config, false)?))
}

/// A `Text` with title defaults: `chart-title` class, 8px margins and side rotation.
pub fn create_title(config: &ItemConfig) -> Result<Box<dyn Item>> {
    Ok(Box::new(Text::new(config, true)?))
}

impl Text {
    pub fn new(config: &ItemConfig, title: bool) -> Result<Self> {
        let mut text = Self {
            state: ComponentState::default(),
            options: TextOptions::default(),
            title,
        };
        text.configure(config)?;
        Ok(text)
    }

    pub fn options(&self) -> &TextOptions {
        &self.options
    }

    fn anchor(&self) -> Anchor {
        self.options
            .anchor
            .unwrap_or_else(|| self.options.text_align.anchor())
    }

    fn rotation(&self) -> f64 {
        match self.options.rotation {
            Some(r) => r,
            None if self.title => match self.state.position {
                Position::Left => -90.0,
                Position::Right => 90.0,
                _ => 0.0,
            },
            None => 0.0,
        }
    }

    fn class(&self) -> Option<&str> {
        match self.options.class.as_deref() {
            Some(class) => Some(class),
            None if self.title => Some("chart-title"),
            None => None,
        }
    }

    fn content(&self, data: &Value) -> String {
        match (&self.options.text, data) {
            (Some(text), _) => text.clone(),
            (None, Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}

impl Item for Text {
    fn configure(&mut self, config: &ItemConfig) -> Result<()> {
        let options: TextOptions = parse_options(config, "Text")?;
        self.state.configure(config)?;
        if self.title && config.options.get("margins").is_none() {
            self.state.margins = tessera_core::Margins::uniform(8.0);
        }
        self.options = options;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>, data: &Value) -> Result<()> {
        let surface = &mut *ctx.surface;
        surface.clear_children(ctx.layer);

        let group = surface.append_child(ctx.layer, "g");
        surface.set_attr(group, "class", "chart-text");
        let node = surface.append_child(group, "text");
        surface.set_attr(node, "text-anchor", self.anchor().as_str());
        surface.set_attr(node, "dominant-baseline", "middle");
        if let Some(class) = self.class() {
            surface.set_attr(node, "class", class);
        }
        if let Some(style) = css(self.options.style.as_ref()) {
            surface.set_attr(node, "style", &style);
        }
        if let Some(font_size) = self.options.font_size {
            surface.set_attr(node, "font-size", &fmt_number(font_size));
        }
        surface.set_text(node, &self.content(data));

        let rotation = rotate(self.rotation(), None);
        let natural = surface
            .bounding_box(node)
            .map(|b| apply_transform(b, &rotation))
            .unwrap_or_default();

        let width = self.state.box_width(natural.width);
        let height = self.state.box_height(natural.height);
        let x = match self.options.text_align {
            TextAlign::Left => 0.0,
            TextAlign::Center => width / 2.0,
            TextAlign::Right => width,
        };
        let y = match self.options.vertical_align {
            VerticalAlign::Top => 0.0,
            VerticalAlign::Middle => height / 2.0,
            VerticalAlign::Bottom => height,
        };
        surface.set_attr(node, "transform", &format!("{} {}", translate(x, y), rotation));
        Ok(())
    }

    fn positioned(&self) -> Option<&dyn Positioned> {
        Some(self)
    }

    fn positioned_mut(&mut self) -> Option<&mut dyn Positioned> {
        Some(self)
    }
}

impl Positioned for Text {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }
}
