use askama::Template;

use crate::render::Choice;
use crate::search::criteria::{DatePosted, ExperienceLevel, SearchForm};

/// The search form, pre-filled from `form`. The resume input always starts
/// empty because browsers do not allow pre-filling file inputs.
#[derive(Template)]
#[template(path = "form.html")]
pub struct FormPage<'a> {
    form: &'a SearchForm,
    warning: Option<&'a str>,
    max_upload_mb: usize,
    experience_choices: Vec<Choice>,
    date_choices: Vec<Choice>,
    no_date: bool,
}

impl<'a> FormPage<'a> {
    pub fn new(form: &'a SearchForm, warning: Option<&'a str>, max_upload_mb: usize) -> Self {
        let experience_choices = ExperienceLevel::ALL
            .iter()
            .map(|level| Choice {
                label: level.label(),
                selected: form.experience_levels.contains(level),
            })
            .collect();

        let date_choices = DatePosted::ALL
            .iter()
            .map(|date| Choice {
                label: date.label(),
                selected: form.date_posted == Some(*date),
            })
            .collect();

        FormPage {
            form,
            warning,
            max_upload_mb,
            experience_choices,
            date_choices,
            no_date: form.date_posted.is_none(),
        }
    }
}
