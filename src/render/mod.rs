//! The function factory and the render runtime.
//!
//! `compile` hands the finished instruction buffer to [`Factory::link`];
//! the factory nests it into a [`RenderPlan`] and exposes the two-stage
//! callable: bind the primitive set and helpers first, then call with
//! data, once per render.

pub mod plan;
pub mod primitives;

use crate::compiler::program::{Instruction, Program};
use crate::compiler::scanner::CompiledSpan;
use crate::error::{Error, Result};
use crate::expr::{self, is_truthy, value_to_string, LoopFrame, Scope};
use crate::options::Options;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub use plan::{Branch, RenderPlan, Step};
pub use primitives::Primitives;

/// A render callable registered under a name, invoked by the delegation
/// directive with the current data
pub type Helper = Arc<dyn Fn(&mut dyn Primitives, &Value) -> Result<()> + Send + Sync>;

/// Name to helper map supplied at bind time
pub type Helpers = HashMap<String, Helper>;

/// Substituted whenever a render call is made without data
static EMPTY_DATA: Lazy<Value> = Lazy::new(|| Value::Object(serde_json::Map::new()));

/// The compiled template: stage one of the two-stage callable.
#[derive(Debug, Clone)]
pub struct Factory {
    plan: Arc<RenderPlan>,
    program: Arc<Program>,
    pretty: bool,
    var_data_name: String,
}

impl Factory {
    pub(crate) fn link(program: Program, options: &Options) -> Result<Self> {
        let plan = plan::link(&program)?;
        Ok(Self {
            plan: Arc::new(plan),
            program: Arc::new(program),
            pretty: options.pretty,
            var_data_name: options.var_data_name.clone(),
        })
    }

    /// Bind the rendering primitives and helpers, producing the render
    /// function. The primitives are owned by the returned value; use
    /// [`Render::into_inner`] to get them back.
    pub fn bind<P: Primitives>(&self, primitives: P, helpers: Helpers) -> Render<P> {
        Render {
            factory: self.clone(),
            primitives,
            helpers,
        }
    }

    /// One-shot borrowed form of `bind(..).call(..)`.
    pub fn render_into(
        &self,
        primitives: &mut dyn Primitives,
        helpers: &Helpers,
        data: Option<&Value>,
    ) -> Result<()> {
        let data = data.unwrap_or(&EMPTY_DATA);
        let mut executor = Executor {
            primitives,
            helpers,
            scope: Scope::new(&self.var_data_name, data),
        };
        executor.run(&self.plan.steps)
    }

    /// Wrap this factory as a helper for another template's `tpl-call`.
    pub fn into_helper(self) -> Helper {
        let empty = Helpers::new();
        Arc::new(move |primitives: &mut dyn Primitives, data: &Value| {
            self.render_into(primitives, &empty, Some(data))
        })
    }

    /// The textual form of the compiled body, line-broken when the
    /// template was compiled with `pretty`.
    pub fn listing(&self) -> String {
        self.program.listing(self.pretty)
    }

    /// The emitted instructions, in event order.
    pub fn instructions(&self) -> &[Instruction] {
        self.program.instructions()
    }
}

/// Stage two: a bound render function. Every call replays the plan
/// against the bound primitives with the data it is given.
pub struct Render<P> {
    factory: Factory,
    primitives: P,
    helpers: Helpers,
}

impl<P: Primitives> Render<P> {
    /// Execute the compiled body. A missing data argument is replaced by
    /// an empty object.
    pub fn call(&mut self, data: Option<&Value>) -> Result<()> {
        self.factory
            .render_into(&mut self.primitives, &self.helpers, data)
    }

    pub fn primitives(&self) -> &P {
        &self.primitives
    }

    pub fn primitives_mut(&mut self) -> &mut P {
        &mut self.primitives
    }

    pub fn into_inner(self) -> P {
        self.primitives
    }
}

struct Executor<'a> {
    primitives: &'a mut dyn Primitives,
    helpers: &'a Helpers,
    scope: Scope<'a>,
}

impl Executor<'_> {
    fn run(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            match step {
                Step::Op(instruction) => self.exec(instruction)?,

                Step::Each {
                    items,
                    item,
                    index,
                    body,
                } => {
                    match items.evaluate(&self.scope)? {
                        Value::Array(entries) => {
                            for (i, entry) in entries.into_iter().enumerate() {
                                self.scope.push_frame(LoopFrame {
                                    item_name: item.clone(),
                                    item: entry,
                                    index_name: index.clone(),
                                    index: i,
                                });
                                let result = self.run(body);
                                self.scope.pop_frame();
                                result?;
                            }
                        }
                        // A null or otherwise absent iterable renders
                        // zero iterations.
                        other if !is_truthy(&other) => {}
                        other => {
                            return Err(Error::evaluation(format!(
                                "iteration source is not an array: {}",
                                other
                            )))
                        }
                    }
                }

                Step::If { branches } => {
                    for branch in branches {
                        let taken = match &branch.condition {
                            None => true,
                            Some(condition) => is_truthy(&condition.evaluate(&self.scope)?),
                        };
                        if taken {
                            self.run(&branch.body)?;
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn exec(&mut self, instruction: &Instruction) -> Result<()> {
        match instruction {
            Instruction::ElementOpen {
                name,
                key,
                statics,
                var_args,
            } => {
                let key_value = self.eval_key(key)?;
                let dynamics = self.eval_var_args(var_args)?;
                self.primitives.element_open(
                    name,
                    key_value.as_deref(),
                    opt_slice(statics),
                    dynamics.as_deref(),
                );
            }

            Instruction::ElementVoid {
                name,
                key,
                statics,
                var_args,
            } => {
                let key_value = self.eval_key(key)?;
                let dynamics = self.eval_var_args(var_args)?;
                self.primitives.element_void(
                    name,
                    key_value.as_deref(),
                    opt_slice(statics),
                    dynamics.as_deref(),
                );
            }

            Instruction::ElementClose { name } => self.primitives.element_close(name),

            Instruction::Text { content } => self.primitives.text(content),

            Instruction::TextDynamic { value } => {
                let evaluated = value.evaluate(&self.scope)?;
                self.primitives.text(&value_to_string(&evaluated));
            }

            Instruction::Skip => self.primitives.skip(),

            Instruction::RawCode { code } => {
                expr::evaluate(code, &self.scope)?;
            }

            Instruction::CallHelper { name } => {
                let helper = self
                    .helpers
                    .get(name)
                    .ok_or_else(|| Error::evaluation(format!("Unknown helper: {}", name)))?;
                helper(&mut *self.primitives, self.scope.data())?;
            }

            Instruction::Log { level, content } => {
                let evaluated = content.evaluate(&self.scope)?;
                log::log!(*level, "{}", value_to_string(&evaluated));
            }

            // Structural markers never survive linking as flat steps.
            Instruction::EachOpen { .. }
            | Instruction::EachClose
            | Instruction::IfOpen { .. }
            | Instruction::ElseIf { .. }
            | Instruction::Else
            | Instruction::IfClose => {
                return Err(Error::template(format!(
                    "structural instruction outside a linked frame: `{}`",
                    instruction
                )))
            }
        }
        Ok(())
    }

    fn eval_key(&self, key: &Option<CompiledSpan>) -> Result<Option<String>> {
        match key {
            None => Ok(None),
            Some(span) => match span.evaluate(&self.scope)? {
                Value::Null => Ok(None),
                value => Ok(Some(value_to_string(&value))),
            },
        }
    }

    fn eval_var_args(
        &self,
        var_args: &[(String, CompiledSpan)],
    ) -> Result<Option<Vec<(String, String)>>> {
        if var_args.is_empty() {
            return Ok(None);
        }
        let mut pairs = Vec::with_capacity(var_args.len());
        for (name, span) in var_args {
            let value = span.evaluate(&self.scope)?;
            pairs.push((name.clone(), value_to_string(&value)));
        }
        Ok(Some(pairs))
    }
}

fn opt_slice(pairs: &[(String, String)]) -> Option<&[(String, String)]> {
    if pairs.is_empty() {
        None
    } else {
        Some(pairs)
    }
}
