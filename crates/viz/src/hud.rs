//! Heads-up display: stage panel, Kp meter, status line, live metrics panel,
//! notices, tooltip, narration caption and the help panel.

use std::collections::VecDeque;

use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow};
use journey_core::stage::KP_MAX;
use journey_core::{CameraMode, HudNotice, LinkStatus, NoticeLevel, TourContext, TourPhase};
use journey_events::LiveMetrics;

use crate::narration::NarrationCaption;
use crate::tour::{TourSet, TourState};

/// Seconds a notice stays on screen, the last of which it fades.
const NOTICE_LIFETIME: f32 = 4.0;
const MAX_NOTICES: usize = 5;
/// Seconds a narration caption stays on screen.
const CAPTION_LIFETIME: f32 = 9.0;
const KP_BAR_WIDTH: f32 = 180.0;

const HELP_TEXT: &str = "1 / 2   speed normal / fast\n\
Space / Right   next stage\n\
Left   previous stage\n\
A   auto-play\n\
P   particles\n\
K   Kp meter\n\
N   narration\n\
F   free camera (right-drag to orbit)\n\
L   live telemetry\n\
+ / -   zoom, or mouse wheel\n\
?   this help\n\
Esc / Q   exit";

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NoticeFeed>()
            .add_systems(Startup, setup_hud)
            .add_systems(
                Update,
                (
                    update_stage_panel,
                    update_kp_meter,
                    update_status_line,
                    update_live_panel,
                    update_notices,
                    update_tooltip,
                    update_caption,
                    update_help,
                    update_cursor,
                )
                    .in_set(TourSet::Sync),
            );
    }
}

#[derive(Component)]
struct StagePanelText;

#[derive(Component)]
struct KpMeterContainer;

#[derive(Component)]
struct KpMeterFill;

#[derive(Component)]
struct KpMeterText;

#[derive(Component)]
struct StatusText;

#[derive(Component)]
struct LivePanelContainer;

#[derive(Component)]
struct LivePanelText;

#[derive(Component)]
struct NoticeText;

#[derive(Component)]
struct TooltipContainer;

#[derive(Component)]
struct TooltipText;

#[derive(Component)]
struct CaptionContainer;

#[derive(Component)]
struct CaptionText;

#[derive(Component)]
struct HelpPanel;

/// Recent notices with their remaining lifetime.
#[derive(Resource, Default)]
pub struct NoticeFeed {
    entries: VecDeque<(HudNotice, f32)>,
}

impl NoticeFeed {
    pub fn push(&mut self, notice: HudNotice) {
        self.entries.push_back((notice, NOTICE_LIFETIME));
        while self.entries.len() > MAX_NOTICES {
            self.entries.pop_front();
        }
    }

    pub fn tick(&mut self, dt: f32) {
        for (_, remaining) in self.entries.iter_mut() {
            *remaining -= dt;
        }
        self.entries.retain(|(_, remaining)| *remaining > 0.0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Notices oldest first, with their opacity.
    pub fn visible(&self) -> impl Iterator<Item = (&HudNotice, f32)> {
        self.entries
            .iter()
            .map(|(notice, remaining)| (notice, remaining.clamp(0.0, 1.0)))
    }
}

pub fn stage_label(ctx: &TourContext) -> String {
    let controller = ctx.controller();
    let total = controller.stages().len();
    match controller.current_stage() {
        Some(stage) => format!(
            "Stage {}/{}: {}",
            controller.current_index() + 1,
            total,
            stage.name
        ),
        None => "No stages".to_string(),
    }
}

pub fn link_label(status: LinkStatus) -> &'static str {
    match status {
        LinkStatus::Offline => "Offline",
        LinkStatus::Connecting => "Connecting",
        LinkStatus::Live => "LIVE",
        LinkStatus::Backoff { .. } => "Reconnecting",
    }
}

pub fn status_line(ctx: &TourContext) -> String {
    let controller = ctx.controller();
    let phase = match controller.phase() {
        TourPhase::Idle => "Paused",
        TourPhase::Playing => "Playing",
        TourPhase::Completed => "Complete",
    };
    let camera = match ctx.camera().mode() {
        CameraMode::Cinematic => "Cinematic",
        CameraMode::Free => "Free",
    };
    let auto = if controller.auto_play() { "on" } else { "off" };
    format!(
        "{} | {}x | Auto-play {} | Camera {} | Data {} | Tour {:.0}%",
        phase,
        controller.speed(),
        auto,
        camera,
        link_label(ctx.telemetry().status()),
        controller.tour_progress() * 100.0
    )
}

/// `1234567` as `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Particle figure for the stage panel: the live flux while the link is up,
/// otherwise the stage's advertised count.
pub fn particle_label(ctx: &TourContext) -> String {
    let telemetry = ctx.telemetry();
    let flux = telemetry
        .latest_metrics()
        .filter(|_| telemetry.is_live())
        .and_then(|m| m.particle_flux)
        .filter(|f| f.is_finite() && *f >= 0.0);
    match flux {
        Some(flux) => format!("{} (live)", group_thousands(flux.round() as u64)),
        None => {
            let count = ctx
                .controller()
                .current_stage()
                .map(|s| s.particle_count)
                .unwrap_or(0);
            group_thousands(count as u64)
        }
    }
}

fn percent(value: Option<f32>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.0}%", v * 100.0),
        None => "--".to_string(),
    }
}

/// Clock time of an RFC 3339 timestamp, or the raw text if it has none.
fn update_time(timestamp: &str) -> &str {
    timestamp
        .split_once('T')
        .and_then(|(_, time)| time.get(..8))
        .unwrap_or(timestamp)
}

/// Body of the live metrics panel.
pub fn live_metrics_text(metrics: &LiveMetrics) -> String {
    let wind = match metrics.solar_wind_speed.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.0} km/s", v),
        None => "--".to_string(),
    };
    let flux = match metrics.particle_flux.filter(|v| v.is_finite() && *v >= 0.0) {
        Some(v) => group_thousands(v.round() as u64),
        None => "--".to_string(),
    };
    let updated = metrics
        .timestamp_utc
        .as_deref()
        .map(update_time)
        .unwrap_or("--");
    format!(
        "Solar wind: {}\nParticle flux: {}\nAurora: {}\nSatellite risk: {}\nUpdated: {}",
        wind,
        flux,
        percent(metrics.aurora_intensity),
        percent(metrics.satellite_risk),
        updated
    )
}

/// Data quality badge text and colour.
pub fn quality_badge(quality: Option<&str>) -> (String, Color) {
    let quality = quality.filter(|q| !q.is_empty()).unwrap_or("unknown");
    let color = match quality {
        "live" | "good" => Color::srgb(0.3, 0.85, 0.45),
        "estimated" | "cached" | "degraded" => Color::srgb(0.98, 0.6, 0.1),
        _ => Color::srgb(0.6, 0.6, 0.7),
    };
    (quality.to_uppercase(), color)
}

/// Fill of the Kp meter in `[0, 1]`.
pub fn kp_fraction(kp: f32) -> f32 {
    if kp.is_finite() {
        (kp / KP_MAX).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Meter colour: green when quiet, amber when active, red in a storm.
fn kp_color(kp: f32) -> Color {
    if kp >= 7.0 {
        Color::srgb(0.95, 0.25, 0.2)
    } else if kp >= 5.0 {
        Color::srgb(0.98, 0.6, 0.1)
    } else {
        Color::srgb(0.3, 0.85, 0.45)
    }
}

fn text_style(size: f32, color: Color) -> TextStyle {
    TextStyle {
        font_size: size,
        color,
        ..default()
    }
}

fn panel_background() -> BackgroundColor {
    Color::srgba(0.02, 0.03, 0.08, 0.75).into()
}

fn shown(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn setup_hud(mut commands: Commands) {
    // Stage panel (top-left)
    commands
        .spawn(NodeBundle {
            style: Style {
                position_type: PositionType::Absolute,
                top: Val::Px(12.0),
                left: Val::Px(12.0),
                padding: UiRect::all(Val::Px(10.0)),
                flex_direction: FlexDirection::Column,
                max_width: Val::Px(420.0),
                ..default()
            },
            background_color: panel_background(),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                TextBundle::from_sections([
                    TextSection::new("", text_style(20.0, Color::srgb(1.0, 0.85, 0.4))),
                    TextSection::new("", text_style(14.0, Color::srgb(0.85, 0.85, 0.9))),
                ]),
                StagePanelText,
            ));
        });

    // Status line (top-right)
    commands.spawn((
        TextBundle::from_section("", text_style(14.0, Color::srgb(0.8, 0.85, 0.9))).with_style(
            Style {
                position_type: PositionType::Absolute,
                top: Val::Px(12.0),
                right: Val::Px(12.0),
                ..default()
            },
        ),
        StatusText,
    ));

    // Live metrics panel (right, under the status line)
    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    top: Val::Px(40.0),
                    right: Val::Px(12.0),
                    padding: UiRect::all(Val::Px(10.0)),
                    min_width: Val::Px(220.0),
                    ..default()
                },
                background_color: panel_background(),
                visibility: Visibility::Hidden,
                ..default()
            },
            LivePanelContainer,
        ))
        .with_children(|parent| {
            parent.spawn((
                TextBundle::from_sections([
                    TextSection::new("LIVE DATA  ", text_style(15.0, Color::srgb(0.95, 0.3, 0.3))),
                    TextSection::new("", text_style(13.0, Color::WHITE)),
                    TextSection::new("", text_style(14.0, Color::srgb(0.85, 0.85, 0.9))),
                ]),
                LivePanelText,
            ));
        });

    // Kp meter (bottom-left)
    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    left: Val::Px(12.0),
                    padding: UiRect::all(Val::Px(8.0)),
                    flex_direction: FlexDirection::Column,
                    row_gap: Val::Px(4.0),
                    ..default()
                },
                background_color: panel_background(),
                ..default()
            },
            KpMeterContainer,
        ))
        .with_children(|parent| {
            parent.spawn((
                TextBundle::from_section("", text_style(14.0, Color::WHITE)),
                KpMeterText,
            ));
            parent
                .spawn(NodeBundle {
                    style: Style {
                        width: Val::Px(KP_BAR_WIDTH),
                        height: Val::Px(10.0),
                        ..default()
                    },
                    background_color: Color::srgba(1.0, 1.0, 1.0, 0.15).into(),
                    ..default()
                })
                .with_children(|bar| {
                    bar.spawn((
                        NodeBundle {
                            style: Style {
                                width: Val::Px(0.0),
                                height: Val::Percent(100.0),
                                ..default()
                            },
                            background_color: kp_color(0.0).into(),
                            ..default()
                        },
                        KpMeterFill,
                    ));
                });
        });

    // Notices (bottom-right)
    commands.spawn((
        TextBundle::from_sections(
            (0..MAX_NOTICES).map(|_| TextSection::new("", text_style(15.0, Color::WHITE))),
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            right: Val::Px(12.0),
            ..default()
        })
        .with_text_justify(JustifyText::Right),
        NoticeText,
    ));

    // Narration caption (bottom-center)
    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(70.0),
                    width: Val::Percent(100.0),
                    justify_content: JustifyContent::Center,
                    ..default()
                },
                visibility: Visibility::Hidden,
                ..default()
            },
            CaptionContainer,
        ))
        .with_children(|parent| {
            parent
                .spawn(NodeBundle {
                    style: Style {
                        padding: UiRect::axes(Val::Px(14.0), Val::Px(8.0)),
                        max_width: Val::Px(760.0),
                        ..default()
                    },
                    background_color: panel_background(),
                    ..default()
                })
                .with_children(|caption| {
                    caption.spawn((
                        TextBundle::from_section("", text_style(16.0, Color::srgb(0.95, 0.95, 1.0)))
                            .with_text_justify(JustifyText::Center),
                        CaptionText,
                    ));
                });
        });

    // Tooltip, positioned at the pointer
    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    padding: UiRect::all(Val::Px(8.0)),
                    max_width: Val::Px(280.0),
                    ..default()
                },
                background_color: Color::srgba(0.05, 0.05, 0.1, 0.9).into(),
                border_color: Color::srgb(0.976, 0.451, 0.086).into(),
                visibility: Visibility::Hidden,
                z_index: ZIndex::Global(10),
                ..default()
            },
            TooltipContainer,
        ))
        .with_children(|parent| {
            parent.spawn((
                TextBundle::from_sections([
                    TextSection::new("", text_style(16.0, Color::srgb(0.976, 0.451, 0.086))),
                    TextSection::new("", text_style(12.0, Color::srgb(0.6, 0.6, 0.7))),
                    TextSection::new("", text_style(13.0, Color::srgb(0.9, 0.9, 0.9))),
                ]),
                TooltipText,
            ));
        });

    // Help panel (centered)
    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    ..default()
                },
                visibility: Visibility::Hidden,
                ..default()
            },
            HelpPanel,
        ))
        .with_children(|parent| {
            parent
                .spawn(NodeBundle {
                    style: Style {
                        padding: UiRect::all(Val::Px(16.0)),
                        flex_direction: FlexDirection::Column,
                        ..default()
                    },
                    background_color: Color::srgba(0.0, 0.0, 0.0, 0.85).into(),
                    ..default()
                })
                .with_children(|panel| {
                    panel.spawn(TextBundle::from_section(
                        "Controls",
                        text_style(18.0, Color::srgb(0.9, 0.9, 0.3)),
                    ));
                    panel.spawn(TextBundle::from_section(
                        HELP_TEXT,
                        text_style(14.0, Color::srgb(0.85, 0.85, 0.85)),
                    ));
                });
        });
}

fn update_stage_panel(tour: Res<TourState>, mut query: Query<&mut Text, With<StagePanelText>>) {
    let ctx = &tour.context;
    let presentation = ctx.presentation();
    let particles = particle_label(ctx);

    for mut text in query.iter_mut() {
        text.sections[0].value = format!("{}\n", stage_label(ctx));
        text.sections[1].value = format!(
            "{}\n{}\nVisible: {}\nParticles: {} | Stage {:.0}%",
            presentation.location,
            presentation.phenomenon,
            presentation.visible_summary,
            particles,
            ctx.controller().stage_progress_percent()
        );
    }
}

fn update_kp_meter(
    tour: Res<TourState>,
    mut container: Query<&mut Visibility, With<KpMeterContainer>>,
    mut label: Query<&mut Text, With<KpMeterText>>,
    mut fill: Query<(&mut Style, &mut BackgroundColor), With<KpMeterFill>>,
) {
    let ctx = &tour.context;
    let kp = ctx.display_kp();

    for mut visibility in container.iter_mut() {
        *visibility = shown(ctx.view().kp_meter);
    }
    for mut text in label.iter_mut() {
        let source = if ctx.telemetry().is_live() { "live" } else { "tour" };
        text.sections[0].value = format!("Kp Index {:.1} ({})", kp, source);
    }
    for (mut style, mut color) in fill.iter_mut() {
        style.width = Val::Px(KP_BAR_WIDTH * kp_fraction(kp));
        *color = kp_color(kp).into();
    }
}

fn update_status_line(tour: Res<TourState>, mut query: Query<&mut Text, With<StatusText>>) {
    let line = status_line(&tour.context);
    for mut text in query.iter_mut() {
        if text.sections[0].value != line {
            text.sections[0].value = line.clone();
        }
    }
}

fn update_live_panel(
    tour: Res<TourState>,
    mut container: Query<&mut Visibility, With<LivePanelContainer>>,
    mut label: Query<&mut Text, With<LivePanelText>>,
) {
    let telemetry = tour.context.telemetry();
    let metrics = telemetry.latest_metrics().filter(|_| telemetry.is_live());

    for mut visibility in container.iter_mut() {
        *visibility = shown(metrics.is_some());
    }
    let Some(metrics) = metrics else {
        return;
    };
    let (badge, color) = quality_badge(metrics.data_quality.as_deref());
    let body = live_metrics_text(metrics);
    for mut text in label.iter_mut() {
        text.sections[1].value = format!("{}\n", badge);
        text.sections[1].style.color = color;
        if text.sections[2].value != body {
            text.sections[2].value = body.clone();
        }
    }
}

fn update_notices(
    mut tour: ResMut<TourState>,
    mut feed: ResMut<NoticeFeed>,
    time: Res<Time>,
    mut query: Query<&mut Text, With<NoticeText>>,
) {
    for notice in tour.context.drain_notices() {
        tracing::debug!("HUD notice: {}", notice.text);
        feed.push(notice);
    }
    feed.tick(time.delta_seconds());

    for mut text in query.iter_mut() {
        let mut visible = feed.visible();
        for section in text.sections.iter_mut() {
            match visible.next() {
                Some((notice, alpha)) => {
                    section.value = format!("{}\n", notice.text);
                    section.style.color = match notice.level {
                        NoticeLevel::Info => Color::srgba(0.85, 0.9, 1.0, alpha),
                        NoticeLevel::Warning => Color::srgba(1.0, 0.45, 0.3, alpha),
                    };
                }
                None => section.value.clear(),
            }
        }
    }
}

fn update_tooltip(
    tour: Res<TourState>,
    mut container: Query<(&mut Style, &mut Visibility), With<TooltipContainer>>,
    mut label: Query<&mut Text, With<TooltipText>>,
) {
    let tooltip = tour.context.tooltip();

    for (mut style, mut visibility) in container.iter_mut() {
        *visibility = shown(tooltip.is_some());
        if let Some(tip) = &tooltip {
            style.left = Val::Px(tip.position.x);
            style.top = Val::Px(tip.position.y);
        }
    }

    if let Some(tip) = tooltip {
        for mut text in label.iter_mut() {
            text.sections[0].value = format!("{}\n", tip.title);
            text.sections[1].value = format!("{}\n", tip.category.to_uppercase());
            text.sections[2].value = tip.description.clone();
        }
    }
}

fn update_caption(
    tour: Res<TourState>,
    caption: Res<NarrationCaption>,
    time: Res<Time>,
    mut shown_sequence: Local<u64>,
    mut remaining: Local<f32>,
    mut container: Query<&mut Visibility, With<CaptionContainer>>,
    mut label: Query<&mut Text, With<CaptionText>>,
) {
    let Some(current) = caption.current() else {
        return;
    };
    if current.sequence != *shown_sequence {
        *shown_sequence = current.sequence;
        *remaining = CAPTION_LIFETIME;
        for mut text in label.iter_mut() {
            text.sections[0].value = format!("{}: {}", current.title, current.text);
        }
    }
    *remaining = (*remaining - time.delta_seconds()).max(0.0);

    let visible = tour.context.view().narration && *remaining > 0.0;
    for mut visibility in container.iter_mut() {
        *visibility = shown(visible);
    }
}

fn update_help(tour: Res<TourState>, mut query: Query<&mut Visibility, With<HelpPanel>>) {
    let help = tour.context.view().help;
    for mut visibility in query.iter_mut() {
        *visibility = shown(help);
    }
}

/// Pointer cursor while something is hovered.
fn update_cursor(mut tour: ResMut<TourState>, mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    let Some(last) = tour.context.drain_hover_changes().pop() else {
        return;
    };
    if let Some(id) = last.entered {
        tracing::debug!("Hovering {:?}", id);
    }
    let icon = if last.entered.is_some() {
        CursorIcon::Pointer
    } else {
        CursorIcon::Default
    };
    for mut window in windows.iter_mut() {
        window.cursor.icon = icon;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use journey_core::telemetry::ScriptedTransport;
    use journey_core::{LogCompletion, SilentNarration, StageSet, TourConfig, TourInput};

    fn context() -> TourContext {
        TourContext::new(
            TourConfig::default(),
            StageSet::defaults(),
            Box::new(SilentNarration),
            Box::new(LogCompletion),
        )
    }

    fn notice(text: &str) -> HudNotice {
        HudNotice {
            text: text.to_string(),
            level: NoticeLevel::Info,
        }
    }

    #[test]
    fn test_notice_feed_expires_and_caps() {
        let mut feed = NoticeFeed::default();
        for i in 0..7 {
            feed.push(notice(&format!("n{}", i)));
        }
        assert_eq!(feed.len(), MAX_NOTICES);
        assert_eq!(feed.visible().next().unwrap().0.text, "n2");

        feed.tick(NOTICE_LIFETIME - 0.5);
        let (_, alpha) = feed.visible().next().unwrap();
        assert!((alpha - 0.5).abs() < 1e-5);

        feed.tick(1.0);
        assert!(feed.is_empty());
    }

    #[test]
    fn test_kp_fraction_bounds() {
        assert_eq!(kp_fraction(4.5), 0.5);
        assert_eq!(kp_fraction(12.0), 1.0);
        assert_eq!(kp_fraction(-1.0), 0.0);
        assert_eq!(kp_fraction(f32::NAN), 0.0);
    }

    #[test]
    fn test_stage_label_and_status() {
        let mut ctx = context();
        assert_eq!(stage_label(&ctx), "Stage 1/7: The Solar Wind Journey Begins");
        assert!(status_line(&ctx).starts_with("Paused | 1x"));
        assert!(status_line(&ctx).contains("Data Offline"));

        ctx.push_input(TourInput::ToggleFreeCam);
        ctx.frame(0.0, &journey_core::ManualClock::at(0.0));
        assert!(status_line(&ctx).contains("Camera Free"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(20500), "20,500");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_live_metrics_text() {
        let metrics = LiveMetrics {
            kp_index: Some(7.0),
            solar_wind_speed: Some(700.0),
            particle_flux: Some(20500.0),
            aurora_intensity: Some(0.6),
            satellite_risk: Some(0.55),
            data_quality: Some("live".to_string()),
            timestamp_utc: Some("2024-05-10T17:00:00Z".to_string()),
        };
        assert_eq!(
            live_metrics_text(&metrics),
            "Solar wind: 700 km/s\nParticle flux: 20,500\nAurora: 60%\nSatellite risk: 55%\nUpdated: 17:00:00"
        );

        let sparse = LiveMetrics {
            particle_flux: Some(f64::NAN),
            timestamp_utc: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert_eq!(
            live_metrics_text(&sparse),
            "Solar wind: --\nParticle flux: --\nAurora: --\nSatellite risk: --\nUpdated: yesterday"
        );
    }

    #[test]
    fn test_quality_badge() {
        assert_eq!(quality_badge(Some("live")).0, "LIVE");
        assert_eq!(quality_badge(Some("estimated")).0, "ESTIMATED");
        assert_eq!(quality_badge(None).0, "UNKNOWN");
        assert_eq!(quality_badge(Some("")).0, "UNKNOWN");
        assert_ne!(quality_badge(Some("live")).1, quality_badge(None).1);
    }

    #[test]
    fn test_particle_label_uses_live_flux() {
        let mut ctx = context();
        let advertised = ctx.controller().current_stage().unwrap().particle_count;
        assert_eq!(particle_label(&ctx), group_thousands(advertised as u64));

        let line = r#"{"metrics":{"kp_index":7.0,"particle_flux":20500.0,"data_quality":"live"},"stage":{"index":0,"changed":false}}"#;
        ctx.set_telemetry_transport(Box::new(ScriptedTransport::with_messages([line])));
        ctx.push_input(TourInput::ToggleLive);
        let clock = journey_core::ManualClock::at(0.0);
        ctx.frame(0.016, &clock);
        assert!(ctx.telemetry().is_live());
        assert_eq!(particle_label(&ctx), "20,500 (live)");

        ctx.push_input(TourInput::ToggleLive);
        ctx.frame(0.016, &clock);
        assert_eq!(particle_label(&ctx), group_thousands(advertised as u64));
    }

    #[test]
    fn test_link_labels() {
        assert_eq!(link_label(LinkStatus::Live), "LIVE");
        assert_eq!(link_label(LinkStatus::Backoff { retry_at: 3.0 }), "Reconnecting");
    }
}
