//! Operator console: one command per line on stdin.
//!
//! ```text
//! reload
//! activate <object> [actor]
//! hit <object> [weapon_type] [attack]
//! grab <object>
//! release <object>
//! collide <object> <target>
//! stats
//! quit
//! ```
//!
//! Objects are scenario names (`chest`) or hex reference ids (`0xFF000003`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail, ensure};
use reactor_engine::Engine;
use reactor_engine::form::RefId;
use reactor_engine::rules::{AttackType, WeaponType};

use crate::producer::{Notification, Producer};
use crate::sim::{SimHost, SimWorld};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reload,
    Activate {
        target: String,
        actor: Option<String>,
    },
    Hit {
        target: String,
        weapon_type: Option<WeaponType>,
        attack: Option<AttackType>,
    },
    Grab(String),
    Release(String),
    Collide {
        object: String,
        target: String,
    },
    Stats,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let arity = |min: usize, max: usize| -> Result<()> {
            ensure!(
                (min..=max).contains(&args.len()),
                "{verb}: expected {min}..={max} arguments, got {}",
                args.len()
            );
            Ok(())
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "reload" => {
                arity(0, 0)?;
                Self::Reload
            }
            "activate" => {
                arity(1, 2)?;
                Self::Activate {
                    target: args[0].to_string(),
                    actor: args.get(1).map(|s| s.to_string()),
                }
            }
            "hit" => {
                arity(1, 3)?;
                let weapon_type = args
                    .get(1)
                    .map(|tag| WeaponType::from_tag(tag).ok_or_else(|| anyhow!("unknown weapon type {tag:?}")))
                    .transpose()?;
                let attack = args
                    .get(2)
                    .map(|tag| AttackType::from_tag(tag).ok_or_else(|| anyhow!("unknown attack type {tag:?}")))
                    .transpose()?;
                Self::Hit {
                    target: args[0].to_string(),
                    weapon_type,
                    attack,
                }
            }
            "grab" => {
                arity(1, 1)?;
                Self::Grab(args[0].to_string())
            }
            "release" => {
                arity(1, 1)?;
                Self::Release(args[0].to_string())
            }
            "collide" => {
                arity(2, 2)?;
                Self::Collide {
                    object: args[0].to_string(),
                    target: args[1].to_string(),
                }
            }
            "stats" => Self::Stats,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command {other:?} (try `help`)"),
        };
        Ok(Some(command))
    }
}

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Quit,
}

pub struct Console {
    world: Arc<SimWorld>,
    producer: Arc<Producer>,
    rules_root: PathBuf,
    /// Default actor for activations and grabs.
    player: Option<RefId>,
}

impl Console {
    pub fn new(world: Arc<SimWorld>, producer: Arc<Producer>, rules_root: PathBuf) -> Self {
        let player = world.find("player");
        Self {
            world,
            producer,
            rules_root,
            player,
        }
    }

    /// Parse and run one line.
    pub fn run_line(&self, engine: &Engine<SimHost>, line: &str) -> Result<Option<Outcome>> {
        match Command::parse(line)? {
            Some(command) => self.execute(engine, command).map(Some),
            None => Ok(None),
        }
    }

    pub fn execute(&self, engine: &Engine<SimHost>, command: Command) -> Result<Outcome> {
        let reply = match command {
            Command::Reload => {
                let stats = engine.reload(&self.rules_root);
                format!(
                    "{} rules from {} documents ({} rules, {} documents skipped)",
                    stats.rules, stats.documents, stats.skipped_rules, stats.skipped_documents
                )
            }
            Command::Activate { target, actor } => {
                let target = self.object(&target)?;
                let actor = match actor {
                    Some(token) => Some(self.object(&token)?),
                    None => self.player,
                };
                let n = self
                    .producer
                    .deliver(engine, Notification::Activated { target, actor });
                self.enqueued(n, target)
            }
            Command::Hit {
                target,
                weapon_type,
                attack,
            } => {
                let target = self.object(&target)?;
                let n = self.producer.deliver(
                    engine,
                    Notification::Hit {
                        target,
                        aggressor: self.player,
                        weapon: None,
                        projectile: None,
                        weapon_type,
                        attack: attack.or(Some(AttackType::Regular)),
                    },
                );
                self.enqueued(n, target)
            }
            Command::Grab(target) => {
                let target = self.object(&target)?;
                let n = self.producer.deliver(
                    engine,
                    Notification::Grabbed {
                        target,
                        actor: self.player,
                    },
                );
                self.enqueued(n, target)
            }
            Command::Release(target) => {
                let target = self.object(&target)?;
                let n = self.producer.deliver(
                    engine,
                    Notification::Released {
                        target,
                        actor: self.player,
                    },
                );
                self.enqueued(n, target)
            }
            Command::Collide { object, target } => {
                let object = self.object(&object)?;
                let target = self.object(&target)?;
                let n = self
                    .producer
                    .deliver(engine, Notification::Collided { object, target });
                self.enqueued(n, target)
            }
            Command::Stats => serde_json::to_string_pretty(&engine.metrics()).context("serializing metrics")?,
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Reply(reply))
    }

    fn object(&self, token: &str) -> Result<RefId> {
        self.world
            .find(token)
            .with_context(|| format!("no object named {token:?}"))
    }

    fn enqueued(&self, n: usize, target: RefId) -> String {
        format!("{} effects queued for {}", n, self.world.describe(target))
    }
}

const HELP: &str = "\
reload                               reload rule documents
activate <object> [actor]            activate an object
hit <object> [weapon_type] [attack]  hit an object
grab <object> / release <object>     pick up or drop an object
collide <object> <target>            report a physics contact
stats                                print engine counters
quit                                 exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_verb() {
        assert_eq!(Command::parse("reload").unwrap(), Some(Command::Reload));
        assert_eq!(
            Command::parse("  activate chest player ").unwrap(),
            Some(Command::Activate {
                target: "chest".into(),
                actor: Some("player".into()),
            })
        );
        assert_eq!(
            Command::parse("HIT rock warhammer power").unwrap(),
            Some(Command::Hit {
                target: "rock".into(),
                weapon_type: Some(WeaponType::Warhammer),
                attack: Some(AttackType::Power),
            })
        );
        assert_eq!(Command::parse("grab bucket").unwrap(), Some(Command::Grab("bucket".into())));
        assert_eq!(
            Command::parse("collide bucket gate").unwrap(),
            Some(Command::Collide {
                object: "bucket".into(),
                target: "gate".into(),
            })
        );
        assert_eq!(Command::parse("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn blank_lines_are_not_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Command::parse("dance").is_err());
        assert!(Command::parse("activate").is_err());
        assert!(Command::parse("collide bucket").is_err());
        assert!(Command::parse("hit rock trebuchet").is_err());
        assert!(Command::parse("release a b").is_err());
    }
}
