//! Assessment operations (quizzes, questions, options, assignments)

use crate::error::{DbError, Result};
use crate::tx::ordering_conflict;
use crate::types::*;
use crate::CourseTx;
use coursecraft_ids::{
    AssignmentId, CourseId, InstructorId, LessonId, OptionId, QuestionId, QuizId,
};
use sqlx::Row;

impl CourseTx {
    // ========================================================================
    // Quiz Operations
    // ========================================================================

    /// Create the quiz specialization of a lesson.
    pub async fn insert_quiz(&mut self, lesson_id: &LessonId, settings: &QuizSettings) -> Result<Quiz> {
        let id = QuizId::new();
        sqlx::query(
            r#"
            INSERT INTO quizzes (id, lesson_id, pass_mark_percent, time_limit_secs, max_attempts, shuffle_questions)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(lesson_id.as_str())
        .bind(settings.pass_mark_percent)
        .bind(settings.time_limit_secs)
        .bind(settings.max_attempts)
        .bind(settings.shuffle_questions)
        .execute(&mut *self.inner)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DbError::constraint(format!("lesson {} already has a quiz", lesson_id))
            }
            _ => DbError::from(err),
        })?;

        Ok(Quiz {
            id,
            lesson_id: lesson_id.clone(),
            settings: settings.clone(),
        })
    }

    /// The quiz attached to a lesson, if any.
    pub async fn get_quiz_for_lesson(&mut self, lesson_id: &LessonId) -> Result<Option<Quiz>> {
        let row = sqlx::query(
            "SELECT id, lesson_id, pass_mark_percent, time_limit_secs, max_attempts, shuffle_questions FROM quizzes WHERE lesson_id = ?",
        )
        .bind(lesson_id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        Ok(row.as_ref().map(row_to_quiz))
    }

    pub async fn update_quiz_settings(&mut self, id: &QuizId, settings: &QuizSettings) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE quizzes SET pass_mark_percent = ?, time_limit_secs = ?, max_attempts = ?, shuffle_questions = ?
            WHERE id = ?
            "#,
        )
        .bind(settings.pass_mark_percent)
        .bind(settings.time_limit_secs)
        .bind(settings.max_attempts)
        .bind(settings.shuffle_questions)
        .bind(id.as_str())
        .execute(&mut *self.inner)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("quiz {}", id)));
        }
        Ok(())
    }

    // ========================================================================
    // Question Operations
    // ========================================================================

    /// Append a question with its options.
    pub async fn insert_question(&mut self, quiz_id: &QuizId, input: &QuestionInput) -> Result<Question> {
        let id = QuestionId::new();

        let row = sqlx::query(
            r#"
            INSERT INTO quiz_questions (id, quiz_id, prompt, kind, points, explanation, order_index)
            SELECT ?, ?, ?, ?, ?, ?, COALESCE(MAX(order_index), 0) + 1
            FROM quiz_questions WHERE quiz_id = ?
            RETURNING order_index
            "#,
        )
        .bind(id.as_str())
        .bind(quiz_id.as_str())
        .bind(&input.prompt)
        .bind(input.kind.as_str())
        .bind(input.points)
        .bind(&input.explanation)
        .bind(quiz_id.as_str())
        .fetch_one(&mut *self.inner)
        .await
        .map_err(|err| ordering_conflict(err, "quiz_questions"))?;

        self.insert_options(&id, &input.options).await?;

        Ok(Question {
            id,
            quiz_id: quiz_id.clone(),
            prompt: input.prompt.clone(),
            kind: input.kind,
            points: input.points,
            explanation: input.explanation.clone(),
            order_index: row.get("order_index"),
        })
    }

    /// Overwrite a question and replace its options wholesale.
    pub async fn update_question(&mut self, id: &QuestionId, input: &QuestionInput) -> Result<()> {
        let result = sqlx::query(
            "UPDATE quiz_questions SET prompt = ?, kind = ?, points = ?, explanation = ? WHERE id = ?",
        )
        .bind(&input.prompt)
        .bind(input.kind.as_str())
        .bind(input.points)
        .bind(&input.explanation)
        .bind(id.as_str())
        .execute(&mut *self.inner)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("question {}", id)));
        }

        self.delete_where("question_options", "question_id", id.as_str())
            .await?;
        self.insert_options(id, &input.options).await
    }

    async fn insert_options(&mut self, question_id: &QuestionId, options: &[OptionInput]) -> Result<()> {
        for (position, option) in options.iter().enumerate() {
            sqlx::query(
                "INSERT INTO question_options (id, question_id, body, is_correct, order_index) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(OptionId::new().as_str())
            .bind(question_id.as_str())
            .bind(&option.body)
            .bind(option.is_correct)
            .bind(position as i64 + 1)
            .execute(&mut *self.inner)
            .await?;
        }
        Ok(())
    }

    /// Get a question by ID
    pub async fn get_question(&mut self, id: &QuestionId) -> Result<Option<Question>> {
        let row = sqlx::query(
            "SELECT id, quiz_id, prompt, kind, points, explanation, order_index FROM quiz_questions WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        row.as_ref().map(row_to_question).transpose()
    }

    /// List a quiz's questions in presentation order
    pub async fn list_questions(&mut self, quiz_id: &QuizId) -> Result<Vec<Question>> {
        let rows = sqlx::query(
            "SELECT id, quiz_id, prompt, kind, points, explanation, order_index FROM quiz_questions WHERE quiz_id = ? ORDER BY order_index",
        )
        .bind(quiz_id.as_str())
        .fetch_all(&mut *self.inner)
        .await?;

        rows.iter().map(row_to_question).collect()
    }

    pub async fn list_options(&mut self, question_id: &QuestionId) -> Result<Vec<QuestionOption>> {
        let rows = sqlx::query(
            "SELECT id, question_id, body, is_correct, order_index FROM question_options WHERE question_id = ? ORDER BY order_index",
        )
        .bind(question_id.as_str())
        .fetch_all(&mut *self.inner)
        .await?;

        Ok(rows
            .iter()
            .map(|row| QuestionOption {
                id: OptionId::from_stored(row.get("id")),
                question_id: QuestionId::from_stored(row.get("question_id")),
                body: row.get("body"),
                is_correct: row.get("is_correct"),
                order_index: row.get("order_index"),
            })
            .collect())
    }

    pub async fn question_ids(&mut self, quiz_id: &QuizId) -> Result<Vec<QuestionId>> {
        let ids = self.child_ids("quiz_questions", "quiz_id", quiz_id.as_str()).await?;
        Ok(ids.into_iter().map(QuestionId::from_stored).collect())
    }

    pub async fn reorder_questions(&mut self, quiz_id: &QuizId, ordered: &[QuestionId]) -> Result<()> {
        let ids: Vec<&str> = ordered.iter().map(|id| id.as_str()).collect();
        self.reorder_children("quiz_questions", "quiz_id", quiz_id.as_str(), &ids)
            .await
    }

    /// Resolve question → quiz → lesson → course → instructor.
    pub async fn question_owner(&mut self, id: &QuestionId) -> Result<Option<QuestionOwner>> {
        let row = sqlx::query(
            r#"
            SELECT q.id AS question_id, z.id AS quiz_id, l.id AS lesson_id,
                   c.id AS course_id, c.instructor_id
            FROM quiz_questions q
            JOIN quizzes z ON z.id = q.quiz_id
            JOIN lessons l ON l.id = z.lesson_id
            JOIN modules m ON m.id = l.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE q.id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        Ok(row.map(|row| QuestionOwner {
            question_id: QuestionId::from_stored(row.get("question_id")),
            quiz_id: QuizId::from_stored(row.get("quiz_id")),
            lesson_id: LessonId::from_stored(row.get("lesson_id")),
            course_id: CourseId::from_stored(row.get("course_id")),
            instructor_id: InstructorId::from_stored(row.get("instructor_id")),
        }))
    }

    // ========================================================================
    // Assignment Operations
    // ========================================================================

    /// Create or overwrite the assignment specialization of a lesson.
    pub async fn upsert_assignment(
        &mut self,
        lesson_id: &LessonId,
        input: &AssignmentInput,
    ) -> Result<Assignment> {
        let row = sqlx::query(
            r#"
            INSERT INTO assignments (id, lesson_id, instructions, max_points, due_days, allow_resubmission)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(lesson_id) DO UPDATE SET
                instructions = excluded.instructions,
                max_points = excluded.max_points,
                due_days = excluded.due_days,
                allow_resubmission = excluded.allow_resubmission
            RETURNING id
            "#,
        )
        .bind(AssignmentId::new().as_str())
        .bind(lesson_id.as_str())
        .bind(&input.instructions)
        .bind(input.max_points)
        .bind(input.due_days)
        .bind(input.allow_resubmission)
        .fetch_one(&mut *self.inner)
        .await?;

        Ok(Assignment {
            id: AssignmentId::from_stored(row.get("id")),
            lesson_id: lesson_id.clone(),
            instructions: input.instructions.clone(),
            max_points: input.max_points,
            due_days: input.due_days,
            allow_resubmission: input.allow_resubmission,
        })
    }

    pub async fn get_assignment_for_lesson(&mut self, lesson_id: &LessonId) -> Result<Option<Assignment>> {
        let row = sqlx::query(
            "SELECT id, lesson_id, instructions, max_points, due_days, allow_resubmission FROM assignments WHERE lesson_id = ?",
        )
        .bind(lesson_id.as_str())
        .fetch_optional(&mut *self.inner)
        .await?;

        Ok(row.map(|row| Assignment {
            id: AssignmentId::from_stored(row.get("id")),
            lesson_id: LessonId::from_stored(row.get("lesson_id")),
            instructions: row.get("instructions"),
            max_points: row.get("max_points"),
            due_days: row.get("due_days"),
            allow_resubmission: row.get("allow_resubmission"),
        }))
    }
}

fn row_to_quiz(row: &sqlx::sqlite::SqliteRow) -> Quiz {
    Quiz {
        id: QuizId::from_stored(row.get("id")),
        lesson_id: LessonId::from_stored(row.get("lesson_id")),
        settings: QuizSettings {
            pass_mark_percent: row.get("pass_mark_percent"),
            time_limit_secs: row.get("time_limit_secs"),
            max_attempts: row.get("max_attempts"),
            shuffle_questions: row.get("shuffle_questions"),
        },
    }
}

fn row_to_question(row: &sqlx::sqlite::SqliteRow) -> Result<Question> {
    let kind_str: String = row.get("kind");
    let kind = QuestionKind::parse(&kind_str)
        .ok_or_else(|| DbError::invalid_state(format!("Unknown question kind: {}", kind_str)))?;

    Ok(Question {
        id: QuestionId::from_stored(row.get("id")),
        quiz_id: QuizId::from_stored(row.get("quiz_id")),
        prompt: row.get("prompt"),
        kind,
        points: row.get("points"),
        explanation: row.get("explanation"),
        order_index: row.get("order_index"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CourseDb;

    async fn quiz_lesson(tx: &mut CourseTx) -> LessonId {
        let course_id = CourseId::new();
        tx.insert_course(&course_id, &InstructorId::parse("inst").unwrap(), "c", &CourseDetails::default())
            .await
            .unwrap();
        let module = tx
            .insert_module(&course_id, &ModuleInput { title: "M".into(), description: None })
            .await
            .unwrap();
        tx.insert_lesson(&module.id, &LessonInput::new("Check", LessonKind::Quiz))
            .await
            .unwrap()
            .id
    }

    fn tf_question(prompt: &str) -> QuestionInput {
        QuestionInput {
            prompt: prompt.into(),
            kind: QuestionKind::TrueFalse,
            points: 1,
            explanation: None,
            options: vec![OptionInput::correct("True"), OptionInput::wrong("False")],
        }
    }

    #[tokio::test]
    async fn one_quiz_per_lesson() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let lesson_id = quiz_lesson(&mut tx).await;

        tx.insert_quiz(&lesson_id, &QuizSettings::default()).await.unwrap();
        let err = tx.insert_quiz(&lesson_id, &QuizSettings::default()).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn update_question_replaces_options() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let lesson_id = quiz_lesson(&mut tx).await;
        let quiz = tx.insert_quiz(&lesson_id, &QuizSettings::default()).await.unwrap();

        let question = tx.insert_question(&quiz.id, &tf_question("Rust is fast")).await.unwrap();
        assert_eq!(question.order_index, 1);

        let edited = QuestionInput {
            prompt: "Pick the systems languages".into(),
            kind: QuestionKind::MultipleChoice,
            points: 3,
            explanation: Some("Both compile to native code".into()),
            options: vec![
                OptionInput::correct("Rust"),
                OptionInput::correct("C"),
                OptionInput::wrong("Bash"),
            ],
        };
        tx.update_question(&question.id, &edited).await.unwrap();

        let options = tx.list_options(&question.id).await.unwrap();
        let bodies: Vec<&str> = options.iter().map(|o| o.body.as_str()).collect();
        assert_eq!(bodies, vec!["Rust", "C", "Bash"]);

        let reloaded = tx.get_question(&question.id).await.unwrap().unwrap();
        assert_eq!(reloaded.kind, QuestionKind::MultipleChoice);
        assert_eq!(reloaded.points, 3);
    }

    #[tokio::test]
    async fn question_owner_reaches_the_course() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let lesson_id = quiz_lesson(&mut tx).await;
        let quiz = tx.insert_quiz(&lesson_id, &QuizSettings::default()).await.unwrap();
        let question = tx.insert_question(&quiz.id, &tf_question("?")).await.unwrap();

        let owner = tx.question_owner(&question.id).await.unwrap().unwrap();
        assert_eq!(owner.lesson_id, lesson_id);
        assert_eq!(owner.quiz_id, quiz.id);
        assert_eq!(owner.instructor_id.as_str(), "inst");
    }

    #[tokio::test]
    async fn assignment_upsert_keeps_id() {
        let db = CourseDb::in_memory().await.unwrap();
        let mut tx = db.begin("test").await.unwrap();
        let lesson_id = quiz_lesson(&mut tx).await;

        let first = tx
            .upsert_assignment(&lesson_id, &AssignmentInput { instructions: "Write".into(), ..Default::default() })
            .await
            .unwrap();
        let second = tx
            .upsert_assignment(
                &lesson_id,
                &AssignmentInput { instructions: "Rewrite".into(), max_points: 50, ..Default::default() },
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let stored = tx.get_assignment_for_lesson(&lesson_id).await.unwrap().unwrap();
        assert_eq!(stored.instructions, "Rewrite");
        assert_eq!(stored.max_points, 50);
    }
}
