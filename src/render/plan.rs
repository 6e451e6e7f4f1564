//! Linking: nest the flat instruction buffer into an executable plan.
//!
//! Elements stay flat (their open/close calls map straight onto
//! primitives); only iteration and conditional frames need structure.
//! Malformed frames are rejected here, which makes them compile-time
//! faults of `compile` itself.

use crate::compiler::program::{Instruction, Program};
use crate::compiler::scanner::CompiledSpan;
use crate::error::{Error, Result};

/// One conditional branch; `condition: None` is the unconditional `else`
#[derive(Debug, Clone)]
pub struct Branch {
    pub condition: Option<CompiledSpan>,
    pub body: Vec<Step>,
}

/// One executable step of the plan
#[derive(Debug, Clone)]
pub enum Step {
    /// A flat instruction, executed as-is
    Op(Instruction),
    /// An iteration with its nested body
    Each {
        items: CompiledSpan,
        item: String,
        index: String,
        body: Vec<Step>,
    },
    /// A conditional chain; the first truthy branch runs, in source order
    If { branches: Vec<Branch> },
}

/// The linked, immutable render plan
#[derive(Debug, Clone, Default)]
pub struct RenderPlan {
    pub steps: Vec<Step>,
}

enum FrameKind {
    Root,
    Each {
        items: CompiledSpan,
        item: String,
        index: String,
    },
    If {
        branches: Vec<Branch>,
        pending: Option<CompiledSpan>,
        seen_else: bool,
    },
}

struct Frame {
    kind: FrameKind,
    steps: Vec<Step>,
}

impl Frame {
    fn describe(&self) -> &'static str {
        match self.kind {
            FrameKind::Root => "template",
            FrameKind::Each { .. } => "iteration",
            FrameKind::If { .. } => "conditional block",
        }
    }
}

pub fn link(program: &Program) -> Result<RenderPlan> {
    let mut stack = vec![Frame {
        kind: FrameKind::Root,
        steps: Vec::new(),
    }];

    for instruction in program.instructions() {
        match instruction {
            Instruction::EachOpen { items, item, index } => {
                stack.push(Frame {
                    kind: FrameKind::Each {
                        items: items.clone(),
                        item: item.clone(),
                        index: index.clone(),
                    },
                    steps: Vec::new(),
                });
            }

            Instruction::EachClose => {
                let frame = pop_frame(&mut stack, instruction)?;
                let open_block = frame.describe();
                match frame.kind {
                    FrameKind::Each { items, item, index } => {
                        push_step(
                            &mut stack,
                            Step::Each {
                                items,
                                item,
                                index,
                                body: frame.steps,
                            },
                        );
                    }
                    _ => {
                        return Err(Error::template(format!(
                            "unexpected iteration close inside a {}",
                            open_block
                        )))
                    }
                }
            }

            Instruction::IfOpen { condition } => {
                stack.push(Frame {
                    kind: FrameKind::If {
                        branches: Vec::new(),
                        pending: Some(condition.clone()),
                        seen_else: false,
                    },
                    steps: Vec::new(),
                });
            }

            Instruction::ElseIf { condition } => {
                let frame = current_conditional(&mut stack, instruction)?;
                if let FrameKind::If {
                    branches,
                    pending,
                    seen_else,
                } = &mut frame.kind
                {
                    if *seen_else {
                        return Err(Error::template(format!(
                            "conditional alternative after the unconditional branch: `{}`",
                            instruction
                        )));
                    }
                    branches.push(Branch {
                        condition: pending.take(),
                        body: std::mem::take(&mut frame.steps),
                    });
                    *pending = Some(condition.clone());
                }
            }

            Instruction::Else => {
                let frame = current_conditional(&mut stack, instruction)?;
                if let FrameKind::If {
                    branches,
                    pending,
                    seen_else,
                } = &mut frame.kind
                {
                    if *seen_else {
                        return Err(Error::template(format!(
                            "duplicate unconditional branch: `{}`",
                            instruction
                        )));
                    }
                    branches.push(Branch {
                        condition: pending.take(),
                        body: std::mem::take(&mut frame.steps),
                    });
                    *seen_else = true;
                }
            }

            Instruction::IfClose => {
                let mut frame = pop_frame(&mut stack, instruction)?;
                let open_block = frame.describe();
                match &mut frame.kind {
                    FrameKind::If {
                        branches, pending, ..
                    } => {
                        branches.push(Branch {
                            condition: pending.take(),
                            body: std::mem::take(&mut frame.steps),
                        });
                        let branches = std::mem::take(branches);
                        push_step(&mut stack, Step::If { branches });
                    }
                    _ => {
                        return Err(Error::template(format!(
                            "unexpected conditional close inside a {}",
                            open_block
                        )))
                    }
                }
            }

            other => push_step(&mut stack, Step::Op(other.clone())),
        }
    }

    let root = match stack.pop() {
        Some(frame) if stack.is_empty() => frame,
        Some(frame) => {
            return Err(Error::template(format!(
                "unclosed {} at end of template",
                frame.describe()
            )))
        }
        None => {
            return Err(Error::template(
                "corrupt instruction stream: empty link stack",
            ))
        }
    };

    Ok(RenderPlan { steps: root.steps })
}

fn push_step(stack: &mut [Frame], step: Step) {
    if let Some(frame) = stack.last_mut() {
        frame.steps.push(step);
    }
}

fn pop_frame(stack: &mut Vec<Frame>, instruction: &Instruction) -> Result<Frame> {
    if stack.len() < 2 {
        return Err(Error::template(format!(
            "unexpected `{}`: no open block",
            instruction
        )));
    }
    stack.pop().ok_or_else(|| {
        Error::template(format!("unexpected `{}`: no open block", instruction))
    })
}

fn current_conditional<'a>(
    stack: &'a mut [Frame],
    instruction: &Instruction,
) -> Result<&'a mut Frame> {
    match stack.last_mut() {
        Some(frame) if matches!(frame.kind, FrameKind::If { .. }) => Ok(frame),
        _ => Err(Error::template(format!(
            "`{}` outside of a conditional block",
            instruction
        ))),
    }
}
