//! Built-in seed templates and the seed file set pushed into fresh
//! repositories.

use crate::store::SeedTemplate;
use crate::vendor::SeedFile;

const DEFAULT_README: &str = "# Course Repository

Welcome to this course repository. This repository contains course materials, assignments, and resources.

## Getting Started

Please read the [syllabus](./syllabus.md) and [contributing guide](./CONTRIBUTING.md) before submitting any work.
";

const EDP_README: &str = "# Event Driven Programming — Course Repository

## Required Accounts

- [ ] Chat workspace account (with profile photo)
- [ ] Source-hosting account
- [ ] Email account
- [ ] Automation-platform account

## Course Requirements

- Minimum **80% attendance**
- Pass each exam (group and 1-on-1)
- Automation workflow project
- Event-driven project in the course repository
- Published article about event-driven programming

## Initial Skills

Know how to:

- Use Markdown format (`# Heading`, `## Subheading`, etc.)
- Use the terminal (`ls`, `cd`, `touch`, `nano`)
- Fork a repository
- Add / edit a file
- Commit changes:
  - `git add .`
  - `git commit -m 'My comment'`
  - `git push origin main`
- Check repository status: `git status`

## Resources

- [Course syllabus](./syllabus.md)
- [Contributing guide](./CONTRIBUTING.md)
";

const OOP_README: &str = "# Object Oriented Programming — Course Repository

## Required Accounts

- [ ] Source-hosting account
- [ ] Email account

## Course Requirements

- Minimum **80% attendance**
- Pass each exam (group and 1-on-1)
- OOP project in the course repository (with documentation)
- Code review participation (at least 2 reviews per semester)

## Initial Skills

Know how to:

- Use Markdown format (`# Heading`, `## Subheading`, etc.)
- Use the terminal (`ls`, `cd`, `touch`, `nano`)
- Fork a repository
- Add / edit a file
- Commit changes:
  - `git add .`
  - `git commit -m 'My comment'`
  - `git push origin main`
- Check repository status: `git status`

## Resources

- [Course syllabus](./syllabus.md)
- [Contributing guide](./CONTRIBUTING.md)
";

const SYLLABUS: &str = "# Course Syllabus

## Course Overview

*Syllabus content to be updated by the instructor.*

## Schedule

| Week | Topic |
|------|-------|
| 1    | Introduction |

## Grading

| Component | Weight |
|-----------|--------|
| Assignments | 50% |
| Final Project | 50% |
";

const CONTRIBUTING: &str = "# Contributing Guide

## Submitting Assignments

1. Create a branch from `main`: `git checkout -b assignment/your-name/assignment-number`
2. Complete your work
3. Open a Pull Request following the PR template
4. Request a review from your instructor
5. Address review comments
6. Merge after approval

## Code Standards

- Write clear, readable code with meaningful variable names
- Include comments for complex logic
- Test your code before submitting
";

const PR_TEMPLATE: &str = "## Summary

Brief description of what this PR does.

## Changes

- [ ] Change 1
- [ ] Change 2

## Testing

Describe how you tested your changes.

## Assignment Checklist

- [ ] All requirements met
- [ ] Code is well-commented
- [ ] No linting errors
";

const ASSIGNMENT_TEMPLATE: &str = "---
name: Assignment Submission
about: Submit a completed assignment
title: \"[Assignment N] Your Name\"
labels: assignment
---

## Assignment Details

**Assignment Number:**
**Due Date:**

## Description

Brief description of what you implemented.

## How to Run

Steps to run your solution.

## Notes

Any additional notes for the reviewer.
";

/// Templates available out of the box; inserted once at schema creation.
pub fn builtin_templates() -> Vec<SeedTemplate> {
    vec![
        SeedTemplate {
            id: "edp".to_string(),
            label: "Event Driven Programming".to_string(),
            description: "Accounts checklist, EDP-specific requirements, and initial Git skills."
                .to_string(),
            content: EDP_README.to_string(),
        },
        SeedTemplate {
            id: "oop".to_string(),
            label: "Object Oriented Programming".to_string(),
            description:
                "Source-hosting checklist, OOP project requirements, code review expectations."
                    .to_string(),
            content: OOP_README.to_string(),
        },
        SeedTemplate {
            id: "default".to_string(),
            label: "Default".to_string(),
            description: "Minimal README pointing to syllabus and contributing guide.".to_string(),
            content: DEFAULT_README.to_string(),
        },
    ]
}

/// The file set seeded into every fresh repository. `readme` comes from the
/// course's chosen template when one is stored; otherwise the built-in
/// default text is used.
pub fn seed_files(readme: Option<String>) -> Vec<SeedFile> {
    vec![
        SeedFile {
            path: "README.md".to_string(),
            content: readme.unwrap_or_else(|| DEFAULT_README.to_string()),
        },
        SeedFile {
            path: "syllabus.md".to_string(),
            content: SYLLABUS.to_string(),
        },
        SeedFile {
            path: "CONTRIBUTING.md".to_string(),
            content: CONTRIBUTING.to_string(),
        },
        SeedFile {
            path: ".github/pull_request_template.md".to_string(),
            content: PR_TEMPLATE.to_string(),
        },
        SeedFile {
            path: ".github/ISSUE_TEMPLATE/assignment.md".to_string(),
            content: ASSIGNMENT_TEMPLATE.to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_unique() {
        let templates = builtin_templates();
        let unique: std::collections::HashSet<_> =
            templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(unique.len(), templates.len());
    }

    #[test]
    fn seed_files_use_template_readme_when_present() {
        let files = seed_files(Some("# My Course".to_string()));
        assert_eq!(files[0].path, "README.md");
        assert_eq!(files[0].content, "# My Course");
    }

    #[test]
    fn seed_files_fall_back_to_default_readme() {
        let files = seed_files(None);
        assert!(files[0].content.starts_with("# Course Repository"));
        assert_eq!(files.len(), 5);
    }
}
