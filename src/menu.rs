//! Data-driven settings menu engine.
//!
//! The menu itself is a fixed table of entries, each exposing three
//! handlers: `show` (display the current value), `adjust` (step the
//! value, persisting immediately), `confirm` (acknowledge and leave
//! edit mode). Navigation is driven purely by newly observed button
//! counters - the engine snapshots the counters it has consumed so
//! each press produces exactly one event.
//!
//! The engine stays pure: it emits `MenuEvent`s and the controller
//! dispatches them through the entry table, which stays data.

/// One row of the menu table. `C` is the dispatch context (the
/// controller), so handlers are plain fn pointers, never closures.
pub struct MenuEntry<C> {
    pub label: &'static str,
    pub show: fn(&mut C),
    pub adjust: fn(&mut C),
    pub confirm: fn(&mut C),
}

/// What the engine decided on this poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuEvent {
    /// Cursor advanced to this entry (short press while idle).
    Advanced(usize),
    /// Adjust the value of this entry (short press while editing).
    Adjust(usize),
    /// Entered edit mode on this entry (long press while idle).
    Entered(usize),
    /// Confirmed this entry and left edit mode (long press editing).
    Confirmed(usize),
    /// Idle timeout forced a reset to the top of the menu.
    TimedOut,
}

/// Cursor + sub-menu state machine.
pub struct MenuEngine {
    index: usize,
    in_submenu: bool,
    last_short: u32,
    last_long: u32,
    last_interaction: u64,
    /// 0 disables the idle timeout.
    timeout_ms: u64,
}

impl MenuEngine {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            index: 0,
            in_submenu: false,
            last_short: 0,
            last_long: 0,
            last_interaction: 0,
            timeout_ms,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn in_submenu(&self) -> bool {
        self.in_submenu
    }

    /// Feed the current monotonic counters; returns at most one event.
    /// Unconsumed presses are picked up on the next poll.
    pub fn poll(
        &mut self,
        entry_count: usize,
        short_presses: u32,
        long_presses: u32,
        now: u64,
    ) -> Option<MenuEvent> {
        if self.timeout_ms > 0
            && now.saturating_sub(self.last_interaction) > self.timeout_ms
            && (self.index != 0 || self.in_submenu)
        {
            self.index = 0;
            self.in_submenu = false;
            self.last_interaction = now;
            return Some(MenuEvent::TimedOut);
        }

        if short_presses > self.last_short {
            self.last_short += 1;
            self.last_interaction = now;
            return Some(if self.in_submenu {
                MenuEvent::Adjust(self.index)
            } else {
                self.index = (self.index + 1) % entry_count;
                MenuEvent::Advanced(self.index)
            });
        }

        if long_presses > self.last_long {
            self.last_long += 1;
            self.last_interaction = now;
            return Some(if self.in_submenu {
                self.in_submenu = false;
                MenuEvent::Confirmed(self.index)
            } else {
                self.in_submenu = true;
                MenuEvent::Entered(self.index)
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 7;

    #[test]
    fn short_press_advances_and_wraps() {
        let mut menu = MenuEngine::new(0);
        for i in 1..N {
            assert_eq!(menu.poll(N, i as u32, 0, 10), Some(MenuEvent::Advanced(i)));
        }
        assert_eq!(menu.poll(N, N as u32, 0, 10), Some(MenuEvent::Advanced(0)));
        assert_eq!(menu.index(), 0);
    }

    #[test]
    fn each_press_is_consumed_exactly_once() {
        let mut menu = MenuEngine::new(0);
        assert_eq!(menu.poll(N, 1, 0, 10), Some(MenuEvent::Advanced(1)));
        assert_eq!(menu.poll(N, 1, 0, 11), None);
        assert_eq!(menu.poll(N, 1, 0, 12), None);
    }

    #[test]
    fn backlogged_presses_drain_one_per_poll() {
        let mut menu = MenuEngine::new(0);
        assert_eq!(menu.poll(N, 3, 0, 10), Some(MenuEvent::Advanced(1)));
        assert_eq!(menu.poll(N, 3, 0, 11), Some(MenuEvent::Advanced(2)));
        assert_eq!(menu.poll(N, 3, 0, 12), Some(MenuEvent::Advanced(3)));
        assert_eq!(menu.poll(N, 3, 0, 13), None);
    }

    #[test]
    fn long_press_enters_then_confirms() {
        let mut menu = MenuEngine::new(0);
        menu.poll(N, 1, 0, 10);
        assert_eq!(menu.poll(N, 1, 1, 20), Some(MenuEvent::Entered(1)));
        assert!(menu.in_submenu());
        // Short press while editing adjusts instead of navigating.
        assert_eq!(menu.poll(N, 2, 1, 30), Some(MenuEvent::Adjust(1)));
        assert_eq!(menu.index(), 1);
        assert_eq!(menu.poll(N, 2, 2, 40), Some(MenuEvent::Confirmed(1)));
        assert!(!menu.in_submenu());
    }

    #[test]
    fn idle_timeout_resets_to_top() {
        let mut menu = MenuEngine::new(1000);
        menu.poll(N, 1, 0, 10);
        assert_eq!(menu.index(), 1);
        assert_eq!(menu.poll(N, 1, 0, 2000), Some(MenuEvent::TimedOut));
        assert_eq!(menu.index(), 0);
        assert!(!menu.in_submenu());
    }

    #[test]
    fn timeout_is_quiet_when_already_at_top() {
        let mut menu = MenuEngine::new(1000);
        assert_eq!(menu.poll(N, 0, 0, 5000), None);
    }

    #[test]
    fn zero_timeout_disables_the_reset() {
        let mut menu = MenuEngine::new(0);
        menu.poll(N, 1, 0, 10);
        assert_eq!(menu.poll(N, 1, 0, 10_000_000), None);
        assert_eq!(menu.index(), 1);
    }

    #[test]
    fn timeout_exits_submenu_too() {
        let mut menu = MenuEngine::new(1000);
        menu.poll(N, 0, 1, 10); // enter edit on entry 0
        assert!(menu.in_submenu());
        assert_eq!(menu.poll(N, 0, 1, 3000), Some(MenuEvent::TimedOut));
        assert!(!menu.in_submenu());
        assert_eq!(menu.index(), 0);
    }
}
