use searchfan_core::text_icon::{badge_layout, foreground_for, render_text_icon, ICON_EDGE};

#[test]
fn two_letter_label_renders_as_a_single_line() {
    let layout = badge_layout("AB");

    assert_eq!(layout.lines, vec!["AB".to_string()]);
    assert_eq!(layout.font_px, ICON_EDGE * 45 / 100);
}

#[test]
fn long_phrase_wraps_and_fits_the_width_budget() {
    let layout = badge_layout("Open Source Community");
    let width_budget = ICON_EDGE * 85 / 100;

    assert!(layout.lines.len() >= 2, "lines: {:?}", layout.lines);
    for line in &layout.lines {
        assert!(
            layout.line_width(line) <= width_budget,
            "line '{line}' width {} exceeds budget {width_budget}",
            layout.line_width(line)
        );
    }
}

#[test]
fn foreground_contrast_follows_background_luminance() {
    assert_eq!(foreground_for(0xffffffff), [0, 0, 0, 255]);
    assert_eq!(foreground_for(0x000000ff), [255, 255, 255, 255]);
}

#[test]
fn rendered_badge_uses_the_contrast_foreground() {
    let on_dark = render_text_icon("I", 0x000000ff);
    assert!(on_dark.pixels().any(|pixel| pixel.0 == [255, 255, 255, 255]));

    let on_light = render_text_icon("I", 0xffffffff);
    assert!(on_light.pixels().any(|pixel| pixel.0 == [0, 0, 0, 255]));
}

#[test]
fn badge_canvas_is_always_the_fixed_edge() {
    let image = render_text_icon("Whatever Label", 0x336699ff);
    assert_eq!(image.width(), ICON_EDGE);
    assert_eq!(image.height(), ICON_EDGE);
}
