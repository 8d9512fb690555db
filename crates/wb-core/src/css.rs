//! CSS value parsing: loosely typed declarations → closed [`Style`].
//!
//! Built on `winnow` 0.7. The element store hands styles over as string
//! pairs (`"paddingTop" => "12px"`); this module parses the subset of values
//! the layout engine understands and reports anything else as a
//! [`ValueError`] without failing the whole style.

use crate::geometry::Sides;
use crate::model::*;
use winnow::ascii::{space0, space1};
use winnow::combinator::{alt, delimited, opt, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// A declaration that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("unsupported property `{0}`")]
    UnknownProperty(String),
    #[error("invalid value `{value}` for `{property}`")]
    InvalidValue { property: String, value: String },
    #[error("`{0}` only applies to flex containers")]
    RequiresFlex(String),
    #[error("`{0}` only applies to positioned elements")]
    RequiresPositioned(String),
}

// ─── Value parsers ───────────────────────────────────────────────────────

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}

fn parse_number(input: &mut &str) -> ModalResult<f32> {
    let start = *input;
    if input.starts_with('-') || input.starts_with('+') {
        *input = &input[1..];
    }
    let int: &str = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let mut frac = "";
    if input.starts_with('.') {
        *input = &input[1..];
        frac = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    }
    if int.is_empty() && frac.is_empty() {
        *input = start;
        return Err(backtrack());
    }
    let matched = &start[..start.len() - input.len()];
    matched.parse::<f32>().map_err(|_| backtrack())
}

/// A number with an optional `px` suffix.
fn parse_px(input: &mut &str) -> ModalResult<f32> {
    let n = parse_number(input)?;
    let _ = opt("px").parse_next(input)?;
    Ok(n)
}

/// `12`, `12px`, or `50%`. Unitless numbers are pixels.
fn parse_length_percentage(input: &mut &str) -> ModalResult<LengthPercentage> {
    let n = parse_number(input)?;
    let unit = opt(alt(("px", "%"))).parse_next(input)?;
    Ok(match unit {
        Some("%") => LengthPercentage::Percent(n),
        _ => LengthPercentage::Px(n),
    })
}

fn parse_dimension(input: &mut &str) -> ModalResult<Dimension> {
    alt((
        alt(("auto", "none")).value(Dimension::Auto),
        parse_length_percentage.map(Dimension::from),
    ))
    .parse_next(input)
}

/// A margin component; `auto` resolves to zero in this model.
fn parse_margin_component(input: &mut &str) -> ModalResult<LengthPercentage> {
    alt((
        "auto".value(LengthPercentage::Px(0.0)),
        parse_length_percentage,
    ))
    .parse_next(input)
}

/// Expand the 1–4 value CSS shorthand into top/right/bottom/left.
fn expand_sides<T: Copy>(values: &[T]) -> Option<Sides<T>> {
    match *values {
        [all] => Some(Sides::all(all)),
        [v, h] => Some(Sides::symmetric(v, h)),
        [top, h, bottom] => Some(Sides {
            top,
            right: h,
            bottom,
            left: h,
        }),
        [top, right, bottom, left] => Some(Sides {
            top,
            right,
            bottom,
            left,
        }),
        _ => None,
    }
}

fn parse_sides(input: &mut &str) -> ModalResult<Sides<LengthPercentage>> {
    let values: Vec<LengthPercentage> =
        separated(1..=4, parse_length_percentage, space1).parse_next(input)?;
    expand_sides(&values).ok_or_else(backtrack)
}

fn parse_margin_sides(input: &mut &str) -> ModalResult<Sides<LengthPercentage>> {
    let values: Vec<LengthPercentage> =
        separated(1..=4, parse_margin_component, space1).parse_next(input)?;
    expand_sides(&values).ok_or_else(backtrack)
}

fn parse_hex_color(input: &mut &str) -> ModalResult<Color> {
    let _ = '#'.parse_next(input)?;
    let hex_digits: &str = take_while(1..=8, |c: char| c.is_ascii_hexdigit()).parse_next(input)?;
    Color::from_hex(hex_digits).ok_or_else(backtrack)
}

/// `rgb(r, g, b)` / `rgba(r, g, b, a)` with 0–255 channels and 0–1 alpha.
fn parse_rgb_color(input: &mut &str) -> ModalResult<Color> {
    let _ = alt(("rgba", "rgb")).parse_next(input)?;
    let channels: Vec<f32> = delimited(
        ('(', space0),
        separated(3..=4, parse_number, (space0, ',', space0)),
        (space0, ')'),
    )
    .parse_next(input)?;
    let c = |v: f32| (v / 255.0).clamp(0.0, 1.0);
    let alpha = channels.get(3).copied().unwrap_or(1.0).clamp(0.0, 1.0);
    Ok(Color::rgba(
        c(channels[0]),
        c(channels[1]),
        c(channels[2]),
        alpha,
    ))
}

fn parse_named_color(input: &mut &str) -> ModalResult<Color> {
    let name: &str = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    named_color(&name.to_ascii_lowercase()).ok_or_else(backtrack)
}

fn named_color(name: &str) -> Option<Color> {
    let hex = match name {
        "transparent" => return Some(Color::TRANSPARENT),
        "black" => "000000",
        "white" => "FFFFFF",
        "red" => "FF0000",
        "green" => "008000",
        "blue" => "0000FF",
        "gray" | "grey" => "808080",
        "yellow" => "FFFF00",
        "orange" => "FFA500",
        "purple" => "800080",
        _ => return None,
    };
    Color::from_hex(hex)
}

fn parse_color(input: &mut &str) -> ModalResult<Color> {
    alt((parse_hex_color, parse_rgb_color, parse_named_color)).parse_next(input)
}

fn parse_quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., |c: char| c == '"'), '"'),
        delimited('\'', take_till(0.., |c: char| c == '\''), '\''),
    ))
    .parse_next(input)
}

fn parse_family(input: &mut &str) -> ModalResult<String> {
    let name: &str = alt((parse_quoted, take_till(1.., |c: char| c == ','))).parse_next(input)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(backtrack());
    }
    Ok(name.to_string())
}

/// Comma separated font families in fallback order.
fn parse_font_family(input: &mut &str) -> ModalResult<Vec<String>> {
    separated(1.., parse_family, (space0, ',', space0)).parse_next(input)
}

/// `normal`, a unitless multiple, `24px`, or `150%`.
fn parse_line_height(input: &mut &str) -> ModalResult<LineHeight> {
    if opt("normal").parse_next(input)?.is_some() {
        return Ok(LineHeight::Normal);
    }
    let n = parse_number(input)?;
    let unit = opt(alt(("px", "%"))).parse_next(input)?;
    Ok(match unit {
        Some("px") => LineHeight::Px(n),
        Some(_) => LineHeight::Multiple(n / 100.0),
        None => LineHeight::Multiple(n),
    })
}

fn parse_font_weight(input: &mut &str) -> ModalResult<u16> {
    alt((
        "normal".value(400u16),
        "bold".value(700u16),
        parse_number.verify_map(|n| {
            let w = n as u16;
            (n.fract() == 0.0 && (1..=1000).contains(&w)).then_some(w)
        }),
    ))
    .parse_next(input)
}

/// `1px solid #000`: width and color in any order, style keyword skipped.
fn parse_border_shorthand(input: &mut &str) -> ModalResult<(Option<LengthPercentage>, Option<Color>)> {
    let mut width = None;
    let mut color = None;
    loop {
        let _ = space0.parse_next(input)?;
        if input.is_empty() {
            break;
        }
        if let Some(w) = opt(parse_length_percentage).parse_next(input)? {
            width = Some(w);
        } else if let Some(c) = opt(parse_color).parse_next(input)? {
            color = Some(c);
        } else {
            let _: &str = alt((
                "solid", "dashed", "dotted", "double", "none", "hidden",
            ))
            .parse_next(input)?;
        }
    }
    Ok((width, color))
}

/// Run `parser` over the whole (trimmed) value.
fn parse_all<'a, O>(
    mut parser: impl Parser<&'a str, O, ErrMode<ContextError>>,
    value: &'a str,
) -> Option<O> {
    let mut rest = value.trim();
    let out = parser.parse_next(&mut rest).ok()?;
    rest.trim().is_empty().then_some(out)
}

/// `paddingTop` → `padding-top`; kebab-case passes through.
pub fn normalize_property(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.trim().chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// ─── Declarations → Style ────────────────────────────────────────────────

fn is_flex_property(name: &str) -> bool {
    matches!(
        name,
        "flex-direction" | "justify-content" | "align-items" | "gap" | "flex-wrap"
    )
}

fn is_offset_property(name: &str) -> bool {
    matches!(name, "top" | "right" | "bottom" | "left")
}

#[derive(Clone, Copy, PartialEq)]
enum PositionMode {
    Static,
    Relative,
    Absolute,
}

impl Style {
    /// Build a style from `(property, value)` pairs.
    ///
    /// Properties may be camelCase or kebab-case; later declarations win.
    /// Flex properties are ignored unless `display` resolves to `flex`, and
    /// offsets unless `position` is `relative` or `absolute`; both cases are
    /// reported in the returned warnings.
    pub fn from_declarations<'a, I>(declarations: I) -> (Style, Vec<ValueError>)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut style = Style::default();
        let mut warnings = Vec::new();
        let mut flex = FlexContainer::default();
        let mut flex_decls = Vec::new();
        let mut wants_flex = false;
        let mut position = PositionMode::Static;
        let mut inset = Inset::default();
        let mut offset_decls = Vec::new();

        for (name, value) in declarations {
            let property = normalize_property(name);
            let value = value.trim();
            let invalid = || ValueError::InvalidValue {
                property: property.clone(),
                value: value.to_string(),
            };

            if is_flex_property(&property) {
                match apply_flex(&mut flex, &property, value) {
                    Some(()) => flex_decls.push(property),
                    None => warnings.push(invalid()),
                }
                continue;
            }
            if is_offset_property(&property) {
                match parse_all(
                    alt(("auto".value(None), parse_length_percentage.map(Some))),
                    value,
                ) {
                    Some(offset) => {
                        match property.as_str() {
                            "top" => inset.top = offset,
                            "right" => inset.right = offset,
                            "bottom" => inset.bottom = offset,
                            _ => inset.left = offset,
                        }
                        offset_decls.push(property);
                    }
                    None => warnings.push(invalid()),
                }
                continue;
            }

            let applied = match property.as_str() {
                "display" => match value.to_ascii_lowercase().as_str() {
                    "block" => {
                        wants_flex = false;
                        style.display = Display::Block;
                        Some(())
                    }
                    "flow-root" => {
                        wants_flex = false;
                        style.display = Display::FlowRoot;
                        Some(())
                    }
                    "flex" => {
                        wants_flex = true;
                        Some(())
                    }
                    "none" => {
                        wants_flex = false;
                        style.display = Display::None;
                        Some(())
                    }
                    _ => None,
                },
                "position" => {
                    position = match value.to_ascii_lowercase().as_str() {
                        "static" => PositionMode::Static,
                        "relative" => PositionMode::Relative,
                        "absolute" => PositionMode::Absolute,
                        _ => {
                            warnings.push(invalid());
                            continue;
                        }
                    };
                    Some(())
                }
                "box-sizing" => match value.to_ascii_lowercase().as_str() {
                    "border-box" => {
                        style.box_sizing = BoxSizing::BorderBox;
                        Some(())
                    }
                    "content-box" => {
                        style.box_sizing = BoxSizing::ContentBox;
                        Some(())
                    }
                    _ => None,
                },
                "width" => parse_all(parse_dimension, value).map(|d| style.width = d),
                "height" => parse_all(parse_dimension, value).map(|d| style.height = d),
                "min-width" => parse_all(parse_dimension, value).map(|d| style.min_width = d),
                "max-width" => parse_all(parse_dimension, value).map(|d| style.max_width = d),
                "min-height" => parse_all(parse_dimension, value).map(|d| style.min_height = d),
                "max-height" => parse_all(parse_dimension, value).map(|d| style.max_height = d),

                "padding" => parse_all(parse_sides, value).map(|s| style.padding = s),
                "padding-top" => parse_all(parse_length_percentage, value).map(|v| style.padding.top = v),
                "padding-right" => parse_all(parse_length_percentage, value).map(|v| style.padding.right = v),
                "padding-bottom" => parse_all(parse_length_percentage, value).map(|v| style.padding.bottom = v),
                "padding-left" => parse_all(parse_length_percentage, value).map(|v| style.padding.left = v),

                "margin" => parse_all(parse_margin_sides, value).map(|s| style.margin = s),
                "margin-top" => parse_all(parse_margin_component, value).map(|v| style.margin.top = v),
                "margin-right" => parse_all(parse_margin_component, value).map(|v| style.margin.right = v),
                "margin-bottom" => parse_all(parse_margin_component, value).map(|v| style.margin.bottom = v),
                "margin-left" => parse_all(parse_margin_component, value).map(|v| style.margin.left = v),

                "border-width" => parse_all(parse_sides, value).map(|s| style.border = s),
                "border-top-width" => parse_all(parse_length_percentage, value).map(|v| style.border.top = v),
                "border-right-width" => parse_all(parse_length_percentage, value).map(|v| style.border.right = v),
                "border-bottom-width" => parse_all(parse_length_percentage, value).map(|v| style.border.bottom = v),
                "border-left-width" => parse_all(parse_length_percentage, value).map(|v| style.border.left = v),
                "border" => parse_all(parse_border_shorthand, value).map(|(width, color)| {
                    if let Some(width) = width {
                        style.border = Sides::all(width);
                    }
                    if color.is_some() {
                        style.border_color = color;
                    }
                }),
                "border-color" => parse_all(parse_color, value).map(|c| style.border_color = Some(c)),

                "background" | "background-color" => {
                    parse_all(parse_color, value).map(|c| style.background = Some(c))
                }
                "color" => parse_all(parse_color, value).map(|c| style.text.color = Some(c)),

                "font-family" => parse_all(parse_font_family, value).map(|f| style.text.font_family = f),
                "font-size" => parse_all(parse_px, value)
                    .filter(|size| *size > 0.0)
                    .map(|size| style.text.font_size = size),
                "font-weight" => parse_all(parse_font_weight, value).map(|w| style.text.font_weight = w),
                "font-style" => match value.to_ascii_lowercase().as_str() {
                    "normal" => {
                        style.text.font_style = FontStyle::Normal;
                        Some(())
                    }
                    "italic" | "oblique" => {
                        style.text.font_style = FontStyle::Italic;
                        Some(())
                    }
                    _ => None,
                },
                "line-height" => parse_all(parse_line_height, value).map(|lh| style.text.line_height = lh),
                "letter-spacing" => parse_all(parse_spacing, value).map(|v| style.text.letter_spacing = v),
                "word-spacing" => parse_all(parse_spacing, value).map(|v| style.text.word_spacing = v),

                _ => {
                    warnings.push(ValueError::UnknownProperty(property.clone()));
                    continue;
                }
            };

            if applied.is_none() {
                warnings.push(invalid());
            }
        }

        if wants_flex {
            style.display = Display::Flex(flex);
        } else {
            for property in flex_decls {
                log::debug!("ignoring `{property}` on a non-flex element");
                warnings.push(ValueError::RequiresFlex(property));
            }
        }

        style.position = match position {
            PositionMode::Static => {
                for property in offset_decls {
                    log::debug!("ignoring `{property}` on a statically positioned element");
                    warnings.push(ValueError::RequiresPositioned(property));
                }
                Position::Static
            }
            PositionMode::Relative => Position::Relative(inset),
            PositionMode::Absolute => Position::Absolute(inset),
        };

        (style, warnings)
    }
}

fn apply_flex(flex: &mut FlexContainer, property: &str, value: &str) -> Option<()> {
    let keyword = value.to_ascii_lowercase();
    match property {
        "flex-direction" => {
            flex.direction = match keyword.as_str() {
                "row" => FlexDirection::Row,
                "column" => FlexDirection::Column,
                _ => return None,
            }
        }
        "justify-content" => {
            flex.justify_content = match keyword.as_str() {
                "flex-start" | "start" | "normal" => JustifyContent::FlexStart,
                "center" => JustifyContent::Center,
                "flex-end" | "end" => JustifyContent::FlexEnd,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => return None,
            }
        }
        "align-items" => {
            flex.align_items = match keyword.as_str() {
                "flex-start" | "start" => AlignItems::FlexStart,
                "center" => AlignItems::Center,
                "flex-end" | "end" => AlignItems::FlexEnd,
                "stretch" | "normal" => AlignItems::Stretch,
                _ => return None,
            }
        }
        "flex-wrap" => {
            flex.wrap = match keyword.as_str() {
                "nowrap" => FlexWrap::NoWrap,
                "wrap" => FlexWrap::Wrap,
                _ => return None,
            }
        }
        "gap" => {
            flex.gap = parse_all(parse_px, value).filter(|g| *g >= 0.0)?;
        }
        _ => return None,
    }
    Some(())
}

/// `normal` or a pixel amount.
fn parse_spacing(input: &mut &str) -> ModalResult<f32> {
    alt(("normal".value(0.0), parse_px)).parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style(decls: &[(&str, &str)]) -> (Style, Vec<ValueError>) {
        Style::from_declarations(decls.iter().copied())
    }

    #[test]
    fn lengths_and_auto() {
        assert_eq!(parse_all(parse_dimension, "auto"), Some(Dimension::Auto));
        assert_eq!(parse_all(parse_dimension, "120px"), Some(Dimension::Px(120.0)));
        assert_eq!(parse_all(parse_dimension, "50%"), Some(Dimension::Percent(50.0)));
        assert_eq!(parse_all(parse_dimension, "12"), Some(Dimension::Px(12.0)));
        assert_eq!(parse_all(parse_dimension, ".5px"), Some(Dimension::Px(0.5)));
        assert_eq!(parse_all(parse_dimension, "12em"), None);
        assert_eq!(parse_all(parse_dimension, ""), None);
    }

    #[test]
    fn side_shorthands() {
        let px = LengthPercentage::Px;
        assert_eq!(parse_all(parse_sides, "4px"), Some(Sides::all(px(4.0))));
        assert_eq!(
            parse_all(parse_sides, "4px 8px"),
            Some(Sides::symmetric(px(4.0), px(8.0)))
        );
        assert_eq!(
            parse_all(parse_sides, "1px 2px 3px"),
            Some(Sides {
                top: px(1.0),
                right: px(2.0),
                bottom: px(3.0),
                left: px(2.0),
            })
        );
        assert_eq!(
            parse_all(parse_sides, "1px 2px 3px 10%"),
            Some(Sides {
                top: px(1.0),
                right: px(2.0),
                bottom: px(3.0),
                left: LengthPercentage::Percent(10.0),
            })
        );
        assert_eq!(parse_all(parse_sides, "1px 2px 3px 4px 5px"), None);
    }

    #[test]
    fn colors() {
        assert_eq!(
            parse_all(parse_color, "#ff0000").map(|c| c.to_rgba8()),
            Some([255, 0, 0, 255])
        );
        assert_eq!(
            parse_all(parse_color, "rgb(0, 128, 255)").map(|c| c.to_rgba8()),
            Some([0, 128, 255, 255])
        );
        assert_eq!(
            parse_all(parse_color, "rgba(0,0,0,0.5)").map(|c| c.to_rgba8()),
            Some([0, 0, 0, 128])
        );
        assert_eq!(parse_all(parse_color, "White"), Some(Color::WHITE));
        assert_eq!(parse_all(parse_color, "chartreuse"), None);
    }

    #[test]
    fn font_family_list_keeps_order() {
        assert_eq!(
            parse_all(parse_font_family, "\"Inter Var\", 'Helvetica Neue', sans-serif"),
            Some(vec![
                "Inter Var".to_string(),
                "Helvetica Neue".to_string(),
                "sans-serif".to_string(),
            ])
        );
    }

    #[test]
    fn line_height_forms() {
        assert_eq!(parse_all(parse_line_height, "normal"), Some(LineHeight::Normal));
        assert_eq!(parse_all(parse_line_height, "1.5"), Some(LineHeight::Multiple(1.5)));
        assert_eq!(parse_all(parse_line_height, "24px"), Some(LineHeight::Px(24.0)));
        assert_eq!(parse_all(parse_line_height, "150%"), Some(LineHeight::Multiple(1.5)));
    }

    #[test]
    fn camel_and_kebab_names() {
        assert_eq!(normalize_property("paddingTop"), "padding-top");
        assert_eq!(normalize_property("padding-top"), "padding-top");
        assert_eq!(normalize_property("backgroundColor"), "background-color");

        let (s, warnings) = style(&[
            ("paddingTop", "12px"),
            ("margin-left", "auto"),
            ("boxSizing", "border-box"),
            ("fontSize", "20px"),
            ("fontWeight", "bold"),
        ]);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(s.padding.top, LengthPercentage::Px(12.0));
        assert_eq!(s.margin.left, LengthPercentage::Px(0.0));
        assert_eq!(s.box_sizing, BoxSizing::BorderBox);
        assert_eq!(s.text.font_size, 20.0);
        assert_eq!(s.text.font_weight, 700);
    }

    #[test]
    fn flex_properties_need_flex_display() {
        let (s, warnings) = style(&[
            ("justifyContent", "space-between"),
            ("display", "flex"),
            ("gap", "8px"),
            ("alignItems", "center"),
        ]);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(
            s.display,
            Display::Flex(FlexContainer {
                justify_content: JustifyContent::SpaceBetween,
                align_items: AlignItems::Center,
                gap: 8.0,
                ..FlexContainer::default()
            })
        );

        let (s, warnings) = style(&[("display", "none"), ("flexDirection", "column")]);
        assert_eq!(s.display, Display::None);
        assert_eq!(
            warnings,
            vec![ValueError::RequiresFlex("flex-direction".into())]
        );
    }

    #[test]
    fn offsets_need_positioning() {
        let (s, warnings) = style(&[("position", "relative"), ("top", "10px"), ("left", "5%")]);
        assert!(warnings.is_empty());
        assert_eq!(
            s.position,
            Position::Relative(Inset {
                top: Some(LengthPercentage::Px(10.0)),
                left: Some(LengthPercentage::Percent(5.0)),
                ..Inset::default()
            })
        );

        let (s, warnings) = style(&[("top", "10px")]);
        assert_eq!(s.position, Position::Static);
        assert_eq!(warnings, vec![ValueError::RequiresPositioned("top".into())]);
    }

    #[test]
    fn bad_values_are_reported_not_fatal() {
        let (s, warnings) = style(&[
            ("width", "wide"),
            ("height", "40px"),
            ("transform", "rotate(4deg)"),
        ]);
        assert_eq!(s.width, Dimension::Auto);
        assert_eq!(s.height, Dimension::Px(40.0));
        assert_eq!(
            warnings,
            vec![
                ValueError::InvalidValue {
                    property: "width".into(),
                    value: "wide".into(),
                },
                ValueError::UnknownProperty("transform".into()),
            ]
        );
    }

    #[test]
    fn border_shorthand() {
        let (s, warnings) = style(&[("border", "2px solid #000000")]);
        assert!(warnings.is_empty());
        assert_eq!(s.border, Sides::all(LengthPercentage::Px(2.0)));
        assert_eq!(s.border_color, Some(Color::BLACK));
    }
}
