//! The hysteresis state machine turning distances into actuation.
use ufmt::uwrite;

use crate::bargraph::segments_lit;
use crate::config::{Tuning, FAREWELL, WELCOME};
use crate::fader::{target_level, FadeOut};
use crate::panel::Panel;

/// Classification of a single distance reading.
///
/// Two separate thresholds keep a presence from flickering in and out when
/// the object rests right at a single cutoff distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    /// The object is beyond [`Tuning::far_threshold_cm`] (or there is none).
    ///
    /// This is the initial state. Entering it ends an active display session
    /// once the LED faded out.
    Far,
    /// The object is closer than [`Tuning::near_threshold_cm`].
    ///
    /// The LED and bar graph follow the distance while in this state.
    Near,
    /// The object is between both thresholds, or the sensor reported `0`.
    ///
    /// Nothing changes in this state: the session, the presence counter and
    /// the brightness stay as they are.
    DeadZone,
}

impl Zone {
    /// Classify a distance. A distance of exactly `0` is a sensor fault and
    /// never counts as near.
    pub const fn classify(distance_cm: u32, tuning: &Tuning) -> Self {
        if distance_cm > 0 && distance_cm < tuning.near_threshold_cm {
            Self::Near
        } else if distance_cm > tuning.far_threshold_cm {
            Self::Far
        } else {
            Self::DeadZone
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Far => "far",
            Self::Near => "near",
            Self::DeadZone => "dead zone",
        }
    }
}

/// The welcome message shown from the arrival of a presence until the
/// farewell sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplaySession {
    /// Loop iterations spent near since the session started.
    presence_duration: u32,
}

/// Noteworthy outcomes of a loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A new display session started.
    Arrived,
    /// The display session ended after the presence stayed for `seconds`.
    Departed { seconds: u32 },
}

/// State of the presence detection, owned by the main loop.
#[derive(Clone, Copy, Debug)]
pub struct Presence {
    tuning: Tuning,
    zone: Zone,
    buzzer_armed: bool,
    session: Option<DisplaySession>,
}

impl Presence {
    pub const fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            zone: Zone::Far,
            buzzer_armed: false,
            session: None,
        }
    }

    pub const fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// The zone of the most recent reading.
    pub const fn zone(&self) -> Zone {
        self.zone
    }

    pub const fn buzzer_armed(&self) -> bool {
        self.buzzer_armed
    }

    /// Iterations spent near during the active display session.
    pub fn presence_duration(&self) -> Option<u32> {
        self.session.map(|session| session.presence_duration)
    }

    pub const fn session_active(&self) -> bool {
        self.session.is_some()
    }

    /// Process the distance measured in this loop iteration.
    pub fn step<P: Panel>(&mut self, distance_cm: u32, panel: &mut P) -> Option<Event> {
        self.zone = Zone::classify(distance_cm, &self.tuning);
        match self.zone {
            Zone::Near => self.near(distance_cm, panel),
            Zone::Far => self.far(panel),
            Zone::DeadZone => None,
        }
    }

    fn near<P: Panel>(&mut self, distance_cm: u32, panel: &mut P) -> Option<Event> {
        let near_threshold_cm = self.tuning.near_threshold_cm;
        panel.show_segments(segments_lit(distance_cm, near_threshold_cm));

        let target = target_level(distance_cm, near_threshold_cm);
        let step = self.tuning.approach_step;
        panel.with_fader(|fader| fader.approach(target, step));
        self.buzzer_armed = true;

        if let Some(session) = &mut self.session {
            session.presence_duration = session.presence_duration.saturating_add(1);
            return None;
        }

        panel.clear();
        panel.print(WELCOME);
        self.session = Some(DisplaySession {
            presence_duration: 0,
        });
        Some(Event::Arrived)
    }

    fn far<P: Panel>(&mut self, panel: &mut P) -> Option<Event> {
        panel.show_segments(0);

        let step = self.tuning.leave_step;
        if panel.with_fader(|fader| fader.fade_out(step)) == FadeOut::Fading {
            return None;
        }

        let session = self.session.take()?;
        if core::mem::take(&mut self.buzzer_armed) {
            panel.beep();
        }

        let seconds = self.tuning.elapsed_seconds(session.presence_duration);
        let hold = self.tuning.message_hold_ms;
        panel.clear();
        let _ = uwrite!(panel, "Time: {} sec", seconds);
        panel.hold(hold);
        panel.clear();
        panel.print(FAREWELL);
        panel.hold(hold);
        panel.clear();

        Some(Event::Departed { seconds })
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::new(Tuning::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use ufmt::uWrite;

    use super::*;
    use crate::config::{Level, MAX_LEVEL};
    use crate::distance::NO_ECHO;
    use crate::fader::{Direction, Fader, Owner};

    #[derive(Debug, PartialEq, Eq)]
    enum Op {
        Clear,
        Text(String),
        Segments(u8),
        Beep,
        Hold(u16),
    }

    #[derive(Default)]
    struct MockPanel {
        ops: Vec<Op>,
        fader: Fader,
    }

    impl MockPanel {
        fn beeps(&self) -> usize {
            self.ops.iter().filter(|op| **op == Op::Beep).count()
        }

        fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn display_ops(&self) -> Vec<&Op> {
            self.ops
                .iter()
                .filter(|op| !matches!(op, Op::Segments(_)))
                .collect()
        }

        fn last_segments(&self) -> Option<u8> {
            self.ops.iter().rev().find_map(|op| match op {
                Op::Segments(segments) => Some(*segments),
                _ => None,
            })
        }
    }

    impl uWrite for MockPanel {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
            match self.ops.last_mut() {
                Some(Op::Text(text)) => text.push_str(s),
                _ => self.ops.push(Op::Text(s.into())),
            }
            Ok(())
        }
    }

    impl Panel for MockPanel {
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }

        fn show_segments(&mut self, segments: u8) {
            self.ops.push(Op::Segments(segments));
        }

        fn beep(&mut self) {
            self.ops.push(Op::Beep);
        }

        fn hold(&mut self, millis: u16) {
            self.ops.push(Op::Hold(millis));
        }

        fn with_fader<R>(&mut self, f: impl FnOnce(&mut Fader) -> R) -> R {
            f(&mut self.fader)
        }
    }

    fn instant_fade() -> Tuning {
        Tuning {
            leave_step: MAX_LEVEL,
            ..Tuning::DEFAULT
        }
    }

    #[test]
    fn thresholds() {
        let tuning = Tuning::DEFAULT;
        assert_eq!(Zone::classify(0, &tuning), Zone::DeadZone);
        assert_eq!(Zone::classify(1, &tuning), Zone::Near);
        assert_eq!(Zone::classify(9, &tuning), Zone::Near);
        assert_eq!(Zone::classify(10, &tuning), Zone::DeadZone);
        assert_eq!(Zone::classify(12, &tuning), Zone::DeadZone);
        assert_eq!(Zone::classify(13, &tuning), Zone::Far);
        assert_eq!(Zone::classify(NO_ECHO, &tuning), Zone::Far);
    }

    #[test]
    fn arrival_and_departure() {
        let mut presence = Presence::new(instant_fade());
        let mut panel = MockPanel::default();

        let events: Vec<_> = [5, 5, 5, 15, 15]
            .into_iter()
            .map(|distance| {
                let event = presence.step(distance, &mut panel);
                (presence.zone(), event, panel.beeps())
            })
            .collect();

        assert_eq!(
            events,
            [
                (Zone::Near, Some(Event::Arrived), 0),
                (Zone::Near, None, 0),
                (Zone::Near, None, 0),
                (Zone::Far, Some(Event::Departed { seconds: 0 }), 1),
                (Zone::Far, None, 1),
            ]
        );
        assert_eq!(panel.texts(), ["WELCOME", "Time: 0 sec", "GOOD BYE"]);
        assert_eq!(
            panel.display_ops(),
            [
                &Op::Clear,
                &Op::Text("WELCOME".into()),
                &Op::Beep,
                &Op::Clear,
                &Op::Text("Time: 0 sec".into()),
                &Op::Hold(2000),
                &Op::Clear,
                &Op::Text("GOOD BYE".into()),
                &Op::Hold(2000),
                &Op::Clear,
            ]
        );
        assert!(!presence.session_active());
        assert!(!presence.buzzer_armed());
        assert_eq!(panel.last_segments(), Some(0));
    }

    #[test]
    fn departure_waits_for_the_slow_fade_out() {
        let tuning = Tuning::DEFAULT;
        let mut presence = Presence::new(tuning);
        let mut panel = MockPanel::default();

        for _ in 0..30 {
            presence.step(9, &mut panel);
        }
        assert_eq!(panel.fader.level(), MAX_LEVEL);

        let fade_steps = usize::from(MAX_LEVEL.div_ceil(tuning.leave_step));
        for step in 1..fade_steps {
            assert_eq!(presence.step(40, &mut panel), None, "fade step {step}");
            assert_eq!(panel.beeps(), 0);
            assert!(presence.session_active());
        }
        assert_eq!(panel.fader.level(), tuning.leave_step);

        assert_eq!(
            presence.step(40, &mut panel),
            Some(Event::Departed { seconds: 2 })
        );
        assert_eq!(panel.beeps(), 1);
        assert_eq!(panel.fader.level(), 0);
        assert_eq!(panel.fader.owner(), Owner::Breathing(Direction::Up));

        for _ in 0..10 {
            assert_eq!(presence.step(40, &mut panel), None);
        }
        assert_eq!(panel.beeps(), 1);
    }

    #[test]
    fn fade_out_is_slower_than_fade_in() {
        let tuning = Tuning::DEFAULT;
        let mut presence = Presence::new(tuning);
        let mut panel = MockPanel::default();

        let mut fade_in = 0;
        while panel.fader.level() != MAX_LEVEL {
            presence.step(9, &mut panel);
            fade_in += 1;
        }
        let mut fade_out = 0;
        while presence.session_active() {
            presence.step(100, &mut panel);
            fade_out += 1;
        }
        assert!(fade_out > fade_in, "{fade_out} <= {fade_in}");
    }

    #[test]
    fn presence_counter_restarts_with_each_session() {
        let mut presence = Presence::new(instant_fade());
        let mut panel = MockPanel::default();
        assert_eq!(presence.presence_duration(), None);

        for expected in 0..5 {
            presence.step(3, &mut panel);
            assert_eq!(presence.presence_duration(), Some(expected));
        }

        presence.step(50, &mut panel);
        assert_eq!(presence.presence_duration(), None);

        presence.step(3, &mut panel);
        assert_eq!(presence.presence_duration(), Some(0));
        presence.step(3, &mut panel);
        assert_eq!(presence.presence_duration(), Some(1));
    }

    #[test]
    fn elapsed_time_uses_the_loop_period() {
        let mut presence = Presence::new(instant_fade());
        let mut panel = MockPanel::default();

        // one iteration starting the session, then 50 * 80ms = 4s
        for _ in 0..51 {
            presence.step(7, &mut panel);
        }
        assert_eq!(
            presence.step(13, &mut panel),
            Some(Event::Departed { seconds: 4 })
        );
        assert!(panel.texts().contains(&"Time: 4 sec"));
    }

    #[test]
    fn zero_distance_never_arrives() {
        let mut presence = Presence::default();
        let mut panel = MockPanel::default();

        for _ in 0..5 {
            assert_eq!(presence.step(0, &mut panel), None);
            assert_eq!(presence.zone(), Zone::DeadZone);
        }
        assert!(!presence.session_active());
        assert!(panel.ops.is_empty());
        assert_eq!(panel.fader, Fader::new());
    }

    #[test]
    fn dead_zone_holds_everything() {
        let mut presence = Presence::default();
        let mut panel = MockPanel::default();

        presence.step(5, &mut panel);
        presence.step(5, &mut panel);
        let level: Level = panel.fader.level();
        let ops = panel.ops.len();

        for distance in [10, 11, 12, 0, 11] {
            assert_eq!(presence.step(distance, &mut panel), None);
            assert_eq!(presence.zone(), Zone::DeadZone);
        }
        assert_eq!(presence.presence_duration(), Some(1));
        assert_eq!(panel.fader.level(), level);
        assert_eq!(panel.fader.owner(), Owner::MainLoop);
        assert_eq!(panel.ops.len(), ops, "the dead zone must not touch any output");

        presence.step(5, &mut panel);
        assert_eq!(presence.presence_duration(), Some(2));
        assert_eq!(panel.texts(), ["WELCOME"]);
    }

    #[test]
    fn returning_during_the_fade_out_resumes_the_session() {
        let mut presence = Presence::default();
        let mut panel = MockPanel::default();

        for _ in 0..10 {
            presence.step(9, &mut panel);
        }
        presence.step(20, &mut panel);
        presence.step(20, &mut panel);
        assert!(presence.session_active());

        assert_eq!(presence.step(9, &mut panel), None);
        assert_eq!(presence.presence_duration(), Some(10));
        assert_eq!(panel.fader.owner(), Owner::MainLoop);
        assert_eq!(panel.texts(), ["WELCOME"]);
        assert_eq!(panel.beeps(), 0);
    }

    #[test]
    fn far_while_idle_keeps_breathing() {
        let mut presence = Presence::default();
        let mut panel = MockPanel::default();
        panel.fader.breathe(100);

        for _ in 0..3 {
            assert_eq!(presence.step(NO_ECHO, &mut panel), None);
        }
        assert_eq!(panel.beeps(), 0);
        assert!(panel.texts().is_empty());
        assert_eq!(panel.fader.level(), 100);
        assert_eq!(panel.fader.owner(), Owner::Breathing(Direction::Up));
        assert_eq!(panel.last_segments(), Some(0));
    }

    #[test]
    fn bar_graph_and_brightness_follow_the_distance() {
        let mut presence = Presence::new(Tuning {
            approach_step: MAX_LEVEL,
            ..Tuning::DEFAULT
        });
        let mut panel = MockPanel::default();

        presence.step(5, &mut panel);
        assert_eq!(panel.last_segments(), Some(4));
        assert_eq!(panel.fader.level(), 500);

        presence.step(1, &mut panel);
        assert_eq!(panel.last_segments(), Some(0));
        assert_eq!(panel.fader.level(), 0);

        presence.step(9, &mut panel);
        assert_eq!(panel.last_segments(), Some(8));
        assert_eq!(panel.fader.level(), MAX_LEVEL);
    }

    #[test]
    fn close_object_departs_without_fading() {
        let mut presence = Presence::default();
        let mut panel = MockPanel::default();

        presence.step(1, &mut panel);
        presence.step(1, &mut panel);
        assert_eq!(panel.fader.level(), 0);
        assert_eq!(
            presence.step(13, &mut panel),
            Some(Event::Departed { seconds: 0 })
        );
        assert_eq!(panel.beeps(), 1);
    }
}
